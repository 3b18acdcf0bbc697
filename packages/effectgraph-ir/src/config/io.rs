//! Configuration I/O schema
//!
//! YAML schema types only; loading and saving live on `EffectConfig`.

use super::effect_config::VisitOrder;
use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1); missing is reported explicitly
    #[serde(default)]
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Field overrides applied on top of the preset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_passes: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_order: Option<VisitOrder>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_kinds: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_defects: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_markers: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_units: Option<bool>,
}
