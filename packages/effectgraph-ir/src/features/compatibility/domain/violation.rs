//! Effect violations
//!
//! Reported values, not `Err`s: a unit with violations still has a complete
//! effect table.

use crate::features::call_graph::domain::{BindingTarget, BoundValue};
use crate::shared::models::{Category, KindList, RoutineId, Span};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum EffectViolation {
    /// Declared empty list, non-empty inferred set
    #[error(
        "'{routine}' is declared to {} no {} but can {}: {kinds}",
        .category.verb(), .category.noun(), .category.verb()
    )]
    ExplicitEmpty {
        routine: RoutineId,
        category: Category,
        kinds: KindList,
        span: Span,
    },

    /// Inferred set not covered by the declared list
    #[error(
        "'{routine}' can {} {} kinds missing from its declared list: {kinds}",
        .category.verb(), .category.noun()
    )]
    UndeclaredEffect {
        routine: RoutineId,
        category: Category,
        kinds: KindList,
        span: Span,
    },

    /// Proc value bound where a narrower proc type is expected
    #[error(
        "cannot bind {value} to {target} in '{routine}': {} kinds not allowed by the declared type: {kinds}",
        .category.noun()
    )]
    IncompatibleBinding {
        routine: RoutineId,
        target: BindingTarget,
        value: BoundValue,
        category: Category,
        kinds: KindList,
        span: Span,
    },

    /// Routine produces a tag it forbids
    #[error("'{routine}' produces forbidden tags: {kinds}")]
    ForbiddenTag {
        routine: RoutineId,
        kinds: KindList,
        span: Span,
    },
}

impl EffectViolation {
    /// Routine the violation is reported in
    pub fn routine(&self) -> &RoutineId {
        match self {
            Self::ExplicitEmpty { routine, .. }
            | Self::UndeclaredEffect { routine, .. }
            | Self::IncompatibleBinding { routine, .. }
            | Self::ForbiddenTag { routine, .. } => routine,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::ExplicitEmpty { category, .. }
            | Self::UndeclaredEffect { category, .. }
            | Self::IncompatibleBinding { category, .. } => *category,
            Self::ForbiddenTag { .. } => Category::Tags,
        }
    }

    /// Offending kinds (the missing-kind witness)
    pub fn kinds(&self) -> &KindList {
        match self {
            Self::ExplicitEmpty { kinds, .. }
            | Self::UndeclaredEffect { kinds, .. }
            | Self::IncompatibleBinding { kinds, .. }
            | Self::ForbiddenTag { kinds, .. } => kinds,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::ExplicitEmpty { span, .. }
            | Self::UndeclaredEffect { span, .. }
            | Self::IncompatibleBinding { span, .. }
            | Self::ForbiddenTag { span, .. } => *span,
        }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::ExplicitEmpty { .. } => "explicit_empty",
            Self::UndeclaredEffect { .. } => "undeclared_effect",
            Self::IncompatibleBinding { .. } => "incompatible_binding",
            Self::ForbiddenTag { .. } => "forbidden_tag",
        }
    }
}
