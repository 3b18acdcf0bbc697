//! Effect set lattice
//!
//! `Known(∅)` is bottom, `Unknown` is top, union is the join. A known set
//! never contains the root kind: inserting the root widens to `Unknown`.
//! Hierarchy-aware queries (`subsumes`, `raises_kind`, handler subtraction)
//! take the category's `KindHierarchy`.

use super::hierarchy::KindHierarchy;
use crate::shared::models::{Kind, KindList};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Set of exception kinds or tag kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSet {
    /// Any effect is possible (the root kind)
    Unknown,
    /// Exactly these kinds (and their descendants)
    Known(BTreeSet<Kind>),
}

/// What a handler catches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// Bare `except:`
    All,
    Kinds(Vec<Kind>),
}

impl Coverage {
    /// Coverage of a handler's kind list (empty list catches everything)
    pub fn of_handler(kinds: &[Kind], hierarchy: &KindHierarchy) -> Self {
        if kinds.is_empty() || kinds.iter().any(|k| hierarchy.is_root(k)) {
            Coverage::All
        } else {
            Coverage::Kinds(kinds.to_vec())
        }
    }

    pub fn covers(&self, kind: &Kind, hierarchy: &KindHierarchy) -> bool {
        match self {
            Coverage::All => true,
            Coverage::Kinds(kinds) => kinds.iter().any(|by| hierarchy.is_covered_by(kind, by)),
        }
    }

    /// Effects re-raised by a bare `raise` inside this handler
    pub fn as_effect_set(&self, hierarchy: &KindHierarchy) -> EffectSet {
        match self {
            Coverage::All => EffectSet::Unknown,
            Coverage::Kinds(kinds) => EffectSet::from_kinds(kinds.iter().cloned(), hierarchy),
        }
    }
}

impl EffectSet {
    pub fn empty() -> Self {
        EffectSet::Known(BTreeSet::new())
    }

    pub fn unknown() -> Self {
        EffectSet::Unknown
    }

    /// Normalizing constructor: root widens to `Unknown`, untracked kinds drop out
    pub fn from_kinds<I>(kinds: I, hierarchy: &KindHierarchy) -> Self
    where
        I: IntoIterator<Item = Kind>,
    {
        let mut set = Self::empty();
        for kind in kinds {
            set.insert(kind, hierarchy);
        }
        set
    }

    /// Re-normalize against `hierarchy` (sets read from outside the unit)
    pub fn normalized(&self, hierarchy: &KindHierarchy) -> Self {
        match self {
            EffectSet::Unknown => EffectSet::Unknown,
            EffectSet::Known(kinds) => Self::from_kinds(kinds.iter().cloned(), hierarchy),
        }
    }

    pub fn singleton(kind: impl Into<Kind>, hierarchy: &KindHierarchy) -> Self {
        Self::from_kinds(std::iter::once(kind.into()), hierarchy)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, EffectSet::Known(kinds) if kinds.is_empty())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, EffectSet::Unknown)
    }

    /// Concrete members; `None` for `Unknown`
    pub fn kinds(&self) -> Option<&BTreeSet<Kind>> {
        match self {
            EffectSet::Unknown => None,
            EffectSet::Known(kinds) => Some(kinds),
        }
    }

    /// Add one kind; returns true if the set grew
    pub fn insert(&mut self, kind: Kind, hierarchy: &KindHierarchy) -> bool {
        if !hierarchy.is_tracked(&kind) || self.is_unknown() {
            return false;
        }
        if hierarchy.is_root(&kind) {
            *self = EffectSet::Unknown;
            return true;
        }
        match self {
            EffectSet::Known(kinds) => kinds.insert(kind),
            EffectSet::Unknown => false,
        }
    }

    /// Join
    pub fn union(&self, other: &EffectSet) -> EffectSet {
        let mut joined = self.clone();
        joined.union_with(other);
        joined
    }

    /// In-place join; returns true if `self` grew
    pub fn union_with(&mut self, other: &EffectSet) -> bool {
        match other {
            EffectSet::Unknown => {
                let grew = !self.is_unknown();
                *self = EffectSet::Unknown;
                grew
            }
            EffectSet::Known(theirs) => match self {
                EffectSet::Unknown => false,
                EffectSet::Known(mine) => {
                    let before = mine.len();
                    mine.extend(theirs.iter().cloned());
                    mine.len() != before
                }
            },
        }
    }

    /// Every element of `other` is covered by some element of `self`
    pub fn subsumes(&self, other: &EffectSet, hierarchy: &KindHierarchy) -> bool {
        match (self, other) {
            (EffectSet::Unknown, _) => true,
            (EffectSet::Known(_), EffectSet::Unknown) => false,
            (EffectSet::Known(mine), EffectSet::Known(theirs)) => theirs
                .iter()
                .all(|kind| mine.iter().any(|by| hierarchy.is_covered_by(kind, by))),
        }
    }

    /// May this set produce an instance of `kind`?
    ///
    /// True for `Unknown`, for a member covered by `kind` (a subtype is an
    /// instance), and for a member covering `kind` (the dynamic kind may be
    /// the narrower one).
    pub fn raises_kind(&self, kind: &Kind, hierarchy: &KindHierarchy) -> bool {
        match self {
            EffectSet::Unknown => true,
            EffectSet::Known(kinds) => kinds.iter().any(|member| {
                hierarchy.is_covered_by(member, kind) || hierarchy.is_covered_by(kind, member)
            }),
        }
    }

    /// Elements of `self` not subsumed by `target` (minimal missing witness)
    pub fn uncovered_by(&self, target: &EffectSet, hierarchy: &KindHierarchy) -> EffectSet {
        match (self, target) {
            (_, EffectSet::Unknown) => EffectSet::empty(),
            (EffectSet::Unknown, EffectSet::Known(_)) => EffectSet::Unknown,
            (EffectSet::Known(mine), EffectSet::Known(theirs)) => EffectSet::Known(
                mine.iter()
                    .filter(|kind| !theirs.iter().any(|by| hierarchy.is_covered_by(kind, by)))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Drop what a handler catches
    ///
    /// `Unknown` only disappears under a catch-all: "everything except K"
    /// is not representable, so it stays `Unknown`.
    pub fn without_covered(&self, coverage: &Coverage, hierarchy: &KindHierarchy) -> EffectSet {
        match (self, coverage) {
            (_, Coverage::All) => EffectSet::empty(),
            (EffectSet::Unknown, Coverage::Kinds(_)) => EffectSet::Unknown,
            (EffectSet::Known(kinds), coverage) => EffectSet::Known(
                kinds
                    .iter()
                    .filter(|kind| !coverage.covers(kind, hierarchy))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Concrete members covered by any of `forbidden`
    ///
    /// `Unknown` yields nothing: only concrete kinds are reported as forbidden.
    pub fn covered_by_any(&self, forbidden: &[Kind], hierarchy: &KindHierarchy) -> EffectSet {
        match self {
            EffectSet::Unknown => EffectSet::empty(),
            EffectSet::Known(kinds) => EffectSet::Known(
                kinds
                    .iter()
                    .filter(|kind| forbidden.iter().any(|by| hierarchy.is_covered_by(kind, by)))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Kind-only listing; `Unknown` is spelled as the root kind
    pub fn to_kind_list(&self, hierarchy: &KindHierarchy) -> KindList {
        match self {
            EffectSet::Unknown => KindList(vec![hierarchy.root().clone()]),
            EffectSet::Known(kinds) => KindList(kinds.iter().cloned().collect()),
        }
    }

    /// `{IOError, OSError}`, `{Exception}` or `{}`
    pub fn describe(&self, hierarchy: &KindHierarchy) -> String {
        format!("{{{}}}", self.to_kind_list(hierarchy))
    }
}

impl Default for EffectSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for EffectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectSet::Unknown => f.write_str("{*}"),
            EffectSet::Known(kinds) => {
                let names: Vec<&str> = kinds.iter().map(Kind::as_str).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
        }
    }
}
