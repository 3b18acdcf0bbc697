//! Effect table
//!
//! Resolved and inferred sets per routine and category, plus the published
//! (finalized, read-only) form exchanged between compilation units.

use crate::errors::{EffectgraphError, Result};
use crate::features::effect_lattice::EffectSet;
use crate::shared::models::{Category, RoutineId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Effects of one routine in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEffects {
    /// What callers see: the declared set if present, else `inferred`
    pub resolved: EffectSet,

    /// What the body produces under the propagation rules
    pub inferred: EffectSet,

    /// `resolved` comes from an explicit annotation
    pub declared: bool,
}

impl CategoryEffects {
    /// Annotated: the declared set is final, inference only cross-checks
    pub fn declared(set: EffectSet) -> Self {
        Self {
            resolved: set,
            inferred: EffectSet::empty(),
            declared: true,
        }
    }

    /// Unannotated: starts at bottom
    pub fn inferred(seed: EffectSet) -> Self {
        Self {
            resolved: seed.clone(),
            inferred: seed,
            declared: false,
        }
    }

    /// Merge a freshly computed body set; returns true if anything grew
    pub fn absorb(&mut self, computed: &EffectSet) -> bool {
        let grew = self.inferred.union_with(computed);
        if grew && !self.declared {
            self.resolved = self.inferred.clone();
        }
        grew
    }

    /// Force to top (pass bound reached)
    pub fn widen(&mut self) {
        self.inferred = EffectSet::Unknown;
        if !self.declared {
            self.resolved = EffectSet::Unknown;
        }
    }
}

/// Effects of one routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineEffects {
    pub routine: RoutineId,
    pub raises: CategoryEffects,
    pub tags: CategoryEffects,
    /// Body was analyzed (false for forward, foreign and imported routines)
    pub analyzed: bool,
    /// Calls may land in an override
    #[serde(default)]
    pub dispatched: bool,
}

impl RoutineEffects {
    pub fn get(&self, category: Category) -> &CategoryEffects {
        match category {
            Category::Raises => &self.raises,
            Category::Tags => &self.tags,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CategoryEffects {
        match category {
            Category::Raises => &mut self.raises,
            Category::Tags => &mut self.tags,
        }
    }

    pub fn resolved(&self, category: Category) -> &EffectSet {
        &self.get(category).resolved
    }

    pub fn inferred(&self, category: Category) -> &EffectSet {
        &self.get(category).inferred
    }

    pub fn is_declared(&self, category: Category) -> bool {
        self.get(category).declared
    }

    /// Set seen through a reference to the routine: an undeclared method
    /// may run any override, so only its declaration bounds it
    pub fn reference_set(&self, category: Category) -> EffectSet {
        if self.dispatched && !self.is_declared(category) {
            EffectSet::Unknown
        } else {
            self.resolved(category).clone()
        }
    }
}

/// Effects of every routine of a unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTable {
    routines: BTreeMap<RoutineId, RoutineEffects>,
}

impl EffectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, effects: RoutineEffects) {
        self.routines.insert(effects.routine.clone(), effects);
    }

    pub fn get(&self, id: &RoutineId) -> Option<&RoutineEffects> {
        self.routines.get(id)
    }

    pub fn get_mut(&mut self, id: &RoutineId) -> Option<&mut RoutineEffects> {
        self.routines.get_mut(id)
    }

    /// Resolved set; `Unknown` for routines the table does not know
    pub fn resolved(&self, id: &RoutineId, category: Category) -> EffectSet {
        self.routines
            .get(id)
            .map(|e| e.resolved(category).clone())
            .unwrap_or(EffectSet::Unknown)
    }

    /// `RoutineEffects::reference_set`; `Unknown` for routines the table does not know
    pub fn reference_set(&self, id: &RoutineId, category: Category) -> EffectSet {
        self.routines
            .get(id)
            .map(|e| e.reference_set(category))
            .unwrap_or(EffectSet::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutineEffects> {
        self.routines.values()
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

/// Current published effects format
pub const PUBLISHED_VERSION: u32 = 1;

/// Published pair of sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedEntry {
    pub raises: EffectSet,
    pub tags: EffectSet,
}

impl PublishedEntry {
    pub fn get(&self, category: Category) -> &EffectSet {
        match category {
            Category::Raises => &self.raises,
            Category::Tags => &self.tags,
        }
    }
}

/// Finalized effects of another compilation unit
///
/// ```json
/// { "version": 1, "unit": "streams",
///   "routines": { "readLine": { "raises": { "known": ["IOError"] }, "tags": "unknown" } } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedEffects {
    pub version: u32,
    pub unit: String,
    pub routines: BTreeMap<RoutineId, PublishedEntry>,
}

impl PublishedEffects {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            version: PUBLISHED_VERSION,
            unit: unit.into(),
            routines: BTreeMap::new(),
        }
    }

    /// Resolved sets of every routine in a finished table
    pub fn from_table(unit: impl Into<String>, table: &EffectTable) -> Self {
        let mut published = Self::new(unit);
        for effects in table.iter() {
            published.routines.insert(
                effects.routine.clone(),
                PublishedEntry {
                    raises: effects.raises.resolved.clone(),
                    tags: effects.tags.resolved.clone(),
                },
            );
        }
        published
    }

    pub fn with_entry(mut self, id: impl Into<String>, raises: EffectSet, tags: EffectSet) -> Self {
        self.routines
            .insert(RoutineId::new(id), PublishedEntry { raises, tags });
        self
    }

    pub fn get(&self, id: &RoutineId) -> Option<&PublishedEntry> {
        self.routines.get(id)
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and reject other format versions
    pub fn from_json(content: &str) -> Result<Self> {
        let published: Self = serde_json::from_str(content)?;
        if published.version != PUBLISHED_VERSION {
            return Err(EffectgraphError::PublishedVersion {
                unit: published.unit,
                found: published.version,
                expected: PUBLISHED_VERSION,
            });
        }
        Ok(published)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::effect_lattice::KindHierarchy;
    use tempfile::NamedTempFile;

    fn io_error() -> EffectSet {
        EffectSet::singleton("IOError", &KindHierarchy::builtin(Category::Raises))
    }

    #[test]
    fn test_declared_resolved_never_moves() {
        let mut effects = CategoryEffects::declared(EffectSet::empty());
        assert!(effects.absorb(&io_error()));
        assert!(effects.resolved.is_empty());
        assert_eq!(effects.inferred, io_error());

        effects.widen();
        assert!(effects.resolved.is_empty());
        assert!(effects.inferred.is_unknown());
    }

    #[test]
    fn test_inferred_resolved_follows() {
        let mut effects = CategoryEffects::inferred(EffectSet::empty());
        assert!(effects.absorb(&io_error()));
        assert!(!effects.absorb(&io_error()));
        assert_eq!(effects.resolved, io_error());
    }

    #[test]
    fn test_missing_routine_is_unknown() {
        let table = EffectTable::new();
        assert!(table
            .resolved(&RoutineId::from("nowhere"), Category::Raises)
            .is_unknown());
    }

    #[test]
    fn test_published_file_roundtrip() {
        let published =
            PublishedEffects::new("streams").with_entry("readLine", io_error(), EffectSet::Unknown);
        let file = NamedTempFile::new().unwrap();
        published.save(file.path()).unwrap();

        let loaded = PublishedEffects::load(file.path()).unwrap();
        assert_eq!(loaded, published);
        assert_eq!(
            loaded.get(&"readLine".into()).unwrap().get(Category::Raises),
            &io_error()
        );
    }

    #[test]
    fn test_published_other_version_rejected() {
        let json = r#"{ "version": 2, "unit": "streams", "routines": {} }"#;
        let err = PublishedEffects::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            EffectgraphError::PublishedVersion { found: 2, expected: 1, .. }
        ));
        assert_eq!(
            err.to_string(),
            "Unsupported published effects version 2 for unit 'streams' (expected 1)"
        );
    }
}
