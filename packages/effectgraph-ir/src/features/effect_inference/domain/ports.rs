/// Ports for effect inference
///
/// - `PublishedEffectsSource`: finalized effects of other compilation units
/// - `PassObserver`: per-pass snapshots of the table under construction
use super::effect_table::{EffectTable, PublishedEffects};
use crate::features::effect_lattice::EffectSet;
use crate::shared::models::{Category, RoutineId};

/// Read-only source of effects finalized by other units
pub trait PublishedEffectsSource: Send + Sync {
    /// Resolved set of an imported routine, if published
    fn lookup(&self, routine: &RoutineId, category: Category) -> Option<EffectSet>;

    /// Name for logging
    fn source_name(&self) -> &str;
}

impl PublishedEffectsSource for PublishedEffects {
    fn lookup(&self, routine: &RoutineId, category: Category) -> Option<EffectSet> {
        self.get(routine).map(|entry| entry.get(category).clone())
    }

    fn source_name(&self) -> &str {
        &self.unit
    }
}

/// Several published tables; the first one that knows a routine wins
#[derive(Debug, Clone, Default)]
pub struct PublishedRegistry {
    tables: Vec<PublishedEffects>,
}

impl PublishedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, table: PublishedEffects) -> Self {
        self.tables.push(table);
        self
    }

    pub fn push(&mut self, table: PublishedEffects) {
        self.tables.push(table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl PublishedEffectsSource for PublishedRegistry {
    fn lookup(&self, routine: &RoutineId, category: Category) -> Option<EffectSet> {
        self.tables
            .iter()
            .find_map(|table| table.lookup(routine, category))
    }

    fn source_name(&self) -> &str {
        "registry"
    }
}

/// Called after every fixpoint pass
pub trait PassObserver {
    fn on_pass(&mut self, pass: usize, table: &EffectTable);
}

impl<F> PassObserver for F
where
    F: FnMut(usize, &EffectTable),
{
    fn on_pass(&mut self, pass: usize, table: &EffectTable) {
        self(pass, table)
    }
}

/// Observer that ignores every pass
pub struct NoopObserver;

impl PassObserver for NoopObserver {
    fn on_pass(&mut self, _pass: usize, _table: &EffectTable) {}
}

/// Metrics of one inference run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceMetrics {
    /// Total analysis time in milliseconds
    pub total_time_ms: f64,

    /// Routines whose bodies were analyzed
    pub routines_analyzed: usize,

    /// Fixpoint passes, including the final no-change pass
    pub passes: usize,

    /// Pass bound in effect
    pub pass_bound: usize,

    /// Routines forced to `Unknown` after hitting the bound
    pub widened: usize,

    /// Imported routines resolved from a published table
    pub published_hits: usize,

    pub converged: bool,
}

impl InferenceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        format!(
            "{} routines, {} passes (bound {}), {} widened, {:.2}ms",
            self.routines_analyzed, self.passes, self.pass_bound, self.widened, self.total_time_ms
        )
    }
}
