//! Effect analysis configuration
//!
//! Two levels:
//! - Preset: `EffectConfig::from_preset(Preset::Strict)`
//! - YAML v1: `EffectConfig::from_yaml("effects.yaml")` with field overrides
//!
//! ```rust,ignore
//! use effectgraph_ir::config::{EffectConfig, Preset, VisitOrder};
//!
//! let config = EffectConfig::from_preset(Preset::Standard)
//!     .visit_order(VisitOrder::Declaration)
//!     .max_passes(64);
//! ```

pub mod effect_config;
pub mod error;
pub mod io;
pub mod preset;
pub mod validation;

pub use effect_config::{EffectConfig, VisitOrder, MAX_PASSES_LIMIT};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use preset::Preset;
pub use validation::Validatable;
