//! Effect analysis configuration

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides};
use super::preset::Preset;
use super::validation::Validatable;
use crate::features::effect_lattice::HierarchyOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper limit for an explicit pass bound
pub const MAX_PASSES_LIMIT: usize = 1_000_000;

/// Order in which the engine visits routines within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitOrder {
    /// Program declaration order
    Declaration,
    /// Strongly connected components, callees before callers
    CalleesFirst,
}

impl Default for VisitOrder {
    fn default() -> Self {
        Self::CalleesFirst
    }
}

/// Effect analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    pub preset: Preset,

    /// Pass bound; 0 derives it from routine count and lattice height
    pub max_passes: usize,

    pub visit_order: VisitOrder,

    /// Undeclared kinds are an error instead of an implicit child of the root
    pub strict_kinds: bool,

    /// Treat untracked kinds (defects) like ordinary kinds
    pub track_defects: bool,

    /// Render every effects marker as an info diagnostic
    pub report_markers: bool,

    /// Analyze independent units on the rayon pool
    pub parallel_units: bool,
}

impl EffectConfig {
    /// Create from preset
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Permissive => Self {
                preset,
                max_passes: 0,
                visit_order: VisitOrder::Declaration,
                strict_kinds: false,
                track_defects: false,
                report_markers: false,
                parallel_units: true,
            },
            Preset::Standard => Self {
                preset,
                max_passes: 0,
                visit_order: VisitOrder::CalleesFirst,
                strict_kinds: false,
                track_defects: false,
                report_markers: true,
                parallel_units: true,
            },
            Preset::Strict => Self {
                preset,
                max_passes: 0,
                visit_order: VisitOrder::CalleesFirst,
                strict_kinds: true,
                track_defects: true,
                report_markers: true,
                parallel_units: true,
            },
        }
    }

    pub fn max_passes(mut self, n: usize) -> Self {
        self.max_passes = n;
        self
    }

    pub fn visit_order(mut self, order: VisitOrder) -> Self {
        self.visit_order = order;
        self
    }

    pub fn strict_kinds(mut self, enabled: bool) -> Self {
        self.strict_kinds = enabled;
        self
    }

    pub fn track_defects(mut self, enabled: bool) -> Self {
        self.track_defects = enabled;
        self
    }

    pub fn report_markers(mut self, enabled: bool) -> Self {
        self.report_markers = enabled;
        self
    }

    pub fn parallel_units(mut self, enabled: bool) -> Self {
        self.parallel_units = enabled;
        self
    }

    /// Options for building kind hierarchies
    pub fn hierarchy_options(&self) -> HierarchyOptions {
        HierarchyOptions {
            strict_kinds: self.strict_kinds,
            track_defects: self.track_defects,
        }
    }

    /// Pass bound for a unit of `routines` routines over a lattice of `height`
    pub fn pass_bound(&self, routines: usize, height: usize) -> usize {
        if self.max_passes > 0 {
            self.max_passes
        } else {
            routines.max(1).saturating_mul(height.max(1)).saturating_add(1)
        }
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(n) = overrides.max_passes {
            self.max_passes = n;
        }
        if let Some(order) = overrides.visit_order {
            self.visit_order = order;
        }
        if let Some(enabled) = overrides.strict_kinds {
            self.strict_kinds = enabled;
        }
        if let Some(enabled) = overrides.track_defects {
            self.track_defects = enabled;
        }
        if let Some(enabled) = overrides.report_markers {
            self.report_markers = enabled;
        }
        if let Some(enabled) = overrides.parallel_units {
            self.parallel_units = enabled;
        }
    }

    /// Differences from the preset defaults
    fn overrides(&self) -> ConfigOverrides {
        let base = Self::from_preset(self.preset);
        ConfigOverrides {
            max_passes: (self.max_passes != base.max_passes).then_some(self.max_passes),
            visit_order: (self.visit_order != base.visit_order).then_some(self.visit_order),
            strict_kinds: (self.strict_kinds != base.strict_kinds).then_some(self.strict_kinds),
            track_defects: (self.track_defects != base.track_defects)
                .then_some(self.track_defects),
            report_markers: (self.report_markers != base.report_markers)
                .then_some(self.report_markers),
            parallel_units: (self.parallel_units != base.parallel_units)
                .then_some(self.parallel_units),
        }
    }

    /// Load a v1 YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse v1 YAML content
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        match export.version {
            None => return Err(ConfigError::MissingVersion),
            Some(1) => {}
            Some(found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: vec![1],
                })
            }
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;

        let mut config = Self::from_preset(preset);
        if let Some(overrides) = export.overrides {
            config.apply(overrides);
        }
        config.validate()?;
        Ok(config)
    }

    /// Serialize as v1 YAML (preset plus the fields that differ from it)
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let overrides = self.overrides();
        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.preset.to_string(),
            overrides: (overrides != ConfigOverrides::default()).then_some(overrides),
        };
        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

impl Validatable for EffectConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_passes > MAX_PASSES_LIMIT {
            return Err(ConfigError::range_with_hint(
                "max_passes",
                self.max_passes,
                0,
                MAX_PASSES_LIMIT,
                "Use 0 for the automatic bound (routines x lattice height + 1)",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "EffectConfig"
    }
}
