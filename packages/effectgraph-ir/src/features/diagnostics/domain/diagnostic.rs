//! Compiler-level diagnostics

use crate::features::compatibility::domain::EffectViolation;
use crate::features::effect_lattice::EffectSet;
use crate::shared::models::{RoutineId, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code (`effects`, `explicit_empty`, ...)
    pub code: String,
    pub routine: RoutineId,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}]: {}",
            self.span, self.severity, self.code, self.message
        )
    }
}

impl From<&EffectViolation> for Diagnostic {
    fn from(violation: &EffectViolation) -> Self {
        Self {
            severity: Severity::Error,
            code: violation.code().to_string(),
            routine: violation.routine().clone(),
            span: violation.span(),
            message: violation.to_string(),
        }
    }
}

/// Effects accumulated up to one marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectReport {
    pub routine: RoutineId,
    /// Marker index within the routine
    pub marker: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub span: Span,
    pub raises: EffectSet,
    pub tags: EffectSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Category, KindList};

    #[test]
    fn test_violation_becomes_error() {
        let violation = EffectViolation::ForbiddenTag {
            routine: "r".into(),
            kinds: KindList(vec!["TimeEffect".into()]),
            span: Span::at(3, 5),
        };
        let diagnostic = Diagnostic::from(&violation);
        assert!(diagnostic.is_error());
        assert_eq!(violation.category(), Category::Tags);
        assert_eq!(
            diagnostic.to_string(),
            "3:5: error [forbidden_tag]: 'r' produces forbidden tags: TimeEffect"
        );
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Error);
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
    }
}
