/*
 * Effectgraph IR - Effect Inference Engine
 *
 * Feature-First Architecture:
 * - shared/      : Program model (routines, statements, kinds, spans)
 * - features/    : Vertical slices (lattice → call graph → inference → compatibility → diagnostics)
 * - config/      : Presets + YAML v1 configuration
 * - pipeline/    : Per-unit orchestration, parallel units
 *
 * Inference:
 * - Least fixed point over the call graph, raises and tags independently
 * - Never fails: imprecision degrades to Unknown
 * - Rayon across independent compilation units
 */

// Crate-level lint configuration
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::should_implement_trait)] // from_str naming intentional
#![allow(clippy::needless_lifetimes)] // Explicit lifetimes for clarity

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration (presets, YAML, validation)
pub mod config;

/// Crate error type
pub mod errors;

/// Feature modules
pub mod features;

/// Per-unit pipeline
pub mod pipeline;

/// Shared program model
pub mod shared;

pub use config::{EffectConfig, Preset, VisitOrder};
pub use errors::{EffectgraphError, Result};
pub use features::call_graph::{CallGraph, CallGraphBuilder, EdgeKind};
pub use features::compatibility::{AssignSource, CompatibilityChecker, EffectViolation};
pub use features::diagnostics::{Diagnostic, EffectReport, EffectsReporter, Severity};
pub use features::effect_inference::{
    EffectInferenceService, EffectTable, FixpointEngine, InferenceMetrics, InferenceOutcome,
    PublishedEffects, PublishedRegistry,
};
pub use features::effect_lattice::{Coverage, EffectSet, Hierarchies, KindHierarchy};
pub use pipeline::{analyze_units, load_program, UnitAnalyzer, UnitResult};
pub use shared::models::{Category, Kind, Program, Routine, RoutineId};
