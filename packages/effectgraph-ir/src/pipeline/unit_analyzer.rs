//! Unit analyzer
//!
//! One compilation unit end to end:
//! validate config -> kind hierarchies -> call graph -> inference ->
//! compatibility check -> marker reports.
//!
//! Units are independent (each gets its own graph, engine and table), so
//! `analyze_units` can fan them out over the rayon pool.

use crate::config::{EffectConfig, Validatable};
use crate::errors::Result;
use crate::features::call_graph::CallGraphBuilder;
use crate::features::compatibility::domain::EffectViolation;
use crate::features::compatibility::CompatibilityChecker;
use crate::features::diagnostics::domain::{Diagnostic, EffectReport};
use crate::features::diagnostics::EffectsReporter;
use crate::features::effect_inference::domain::{
    EffectTable, InferenceMetrics, PublishedEffects, PublishedRegistry,
};
use crate::features::effect_inference::EffectInferenceService;
use crate::features::effect_lattice::Hierarchies;
use crate::shared::models::Program;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::time::Instant;

/// Everything produced for one unit
#[derive(Debug, Clone)]
pub struct UnitResult {
    pub unit: String,
    pub table: EffectTable,
    pub violations: Vec<EffectViolation>,
    pub reports: Vec<EffectReport>,
    /// Errors first, then marker reports, each in source order
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: InferenceMetrics,
}

impl UnitResult {
    pub fn has_errors(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Finalized sets for importing units
    pub fn published(&self) -> PublishedEffects {
        PublishedEffects::from_table(self.unit.clone(), &self.table)
    }
}

pub struct UnitAnalyzer {
    config: EffectConfig,
    service: EffectInferenceService,
}

impl UnitAnalyzer {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            service: EffectInferenceService::new(config.clone()),
            config,
        }
    }

    /// Effects published by other units, consulted for imported routines
    pub fn with_published(self, published: PublishedRegistry) -> Self {
        Self {
            service: self.service.with_registry(published),
            config: self.config,
        }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn analyze(&self, program: &Program) -> Result<UnitResult> {
        let start = Instant::now();
        self.config.validate()?;

        let hierarchies = Hierarchies::from_program(program, self.config.hierarchy_options())?;
        let graph = CallGraphBuilder::new(program, &hierarchies).build()?;

        let outcome = self.service.infer(program, &graph, &hierarchies);
        let table = outcome.table;

        let violations =
            CompatibilityChecker::new(&hierarchies, &table).check_program(program, &graph);

        let reporter = EffectsReporter::new(&graph, &hierarchies, &table);
        let reports = if self.config.report_markers {
            reporter.report_all()
        } else {
            Vec::new()
        };

        let mut diagnostics: Vec<Diagnostic> = violations.iter().map(Diagnostic::from).collect();
        diagnostics.extend(reports.iter().map(|r| reporter.to_diagnostic(r)));

        tracing::info!(
            unit = %program.unit,
            violations = violations.len(),
            reports = reports.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "unit analyzed"
        );

        Ok(UnitResult {
            unit: program.unit.clone(),
            table,
            violations,
            reports,
            diagnostics,
            metrics: outcome.metrics,
        })
    }
}

/// Analyze independent units, in parallel when `parallel_units` is set
///
/// Results keep the input order.
pub fn analyze_units(programs: &[Program], config: &EffectConfig) -> Vec<Result<UnitResult>> {
    let analyzer = UnitAnalyzer::new(config.clone());
    analyze_units_with(&analyzer, programs)
}

pub fn analyze_units_with(analyzer: &UnitAnalyzer, programs: &[Program]) -> Vec<Result<UnitResult>> {
    tracing::info!(
        units = programs.len(),
        parallel = analyzer.config.parallel_units,
        "analyzing units"
    );

    #[cfg(feature = "parallel")]
    {
        if analyzer.config.parallel_units {
            return programs
                .par_iter()
                .map(|program| analyzer.analyze(program))
                .collect();
        }
    }

    programs
        .iter()
        .map(|program| analyzer.analyze(program))
        .collect()
}
