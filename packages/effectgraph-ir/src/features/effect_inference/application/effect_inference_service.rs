/// Application service for effect inference
///
/// Owns the configuration and the published effects of other units; each
/// call to `infer` runs an isolated engine over one unit.
use crate::config::EffectConfig;
use crate::features::call_graph::CallGraph;
use crate::features::effect_inference::domain::{
    InferenceMetrics, PassObserver, PublishedEffects, PublishedRegistry,
};
use crate::features::effect_inference::infrastructure::{FixpointEngine, InferenceOutcome};
use crate::features::effect_lattice::Hierarchies;
use crate::shared::models::Program;
use std::sync::Mutex;

/// Effect inference service
///
/// Usage:
/// ```text
/// let service = EffectInferenceService::new(config).with_published(streams_effects);
/// let outcome = service.infer(&program, &graph, &hierarchies);
/// ```
pub struct EffectInferenceService {
    config: EffectConfig,
    published: PublishedRegistry,
    metrics: Mutex<InferenceMetrics>,
}

impl EffectInferenceService {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            config,
            published: PublishedRegistry::new(),
            metrics: Mutex::new(InferenceMetrics::new()),
        }
    }

    pub fn with_published(mut self, published: PublishedEffects) -> Self {
        self.published.push(published);
        self
    }

    pub fn with_registry(mut self, registry: PublishedRegistry) -> Self {
        self.published = registry;
        self
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    /// Infer every routine of one unit
    pub fn infer(
        &self,
        program: &Program,
        graph: &CallGraph,
        hierarchies: &Hierarchies,
    ) -> InferenceOutcome {
        let outcome = self.engine(program, graph, hierarchies).run();
        self.record(&outcome.metrics);
        outcome
    }

    /// Same as `infer`, reporting the table after every pass
    pub fn infer_observed(
        &self,
        program: &Program,
        graph: &CallGraph,
        hierarchies: &Hierarchies,
        observer: &mut dyn PassObserver,
    ) -> InferenceOutcome {
        let outcome = self
            .engine(program, graph, hierarchies)
            .run_observed(observer);
        self.record(&outcome.metrics);
        outcome
    }

    /// Metrics of the most recent run
    pub fn metrics(&self) -> InferenceMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn engine<'a>(
        &'a self,
        program: &'a Program,
        graph: &'a CallGraph,
        hierarchies: &'a Hierarchies,
    ) -> FixpointEngine<'a> {
        FixpointEngine::new(program, graph, hierarchies, &self.config).with_published(&self.published)
    }

    fn record(&self, metrics: &InferenceMetrics) {
        if let Ok(mut last) = self.metrics.lock() {
            *last = metrics.clone();
        }
    }
}
