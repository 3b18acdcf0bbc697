//! Preset configurations
//!
//! Presets provide complete default configurations for common use cases.

use serde::{Deserialize, Serialize};

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Lenient: no marker reports, declaration-order visiting
    Permissive,

    /// Default: undeclared kinds hang off the root, defects untracked,
    /// marker reports on
    Standard,

    /// Strict: every kind must be declared and defects are tracked
    Strict,
}

impl Preset {
    /// Parse preset from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "standard" => Ok(Self::Standard),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "Unknown preset '{}'. Valid presets: permissive, standard, strict",
                s
            )),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Standard => "standard",
            Self::Strict => "strict",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Standard
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_from_str() {
        assert_eq!(Preset::from_str("strict").unwrap(), Preset::Strict);
        assert_eq!(Preset::from_str("STANDARD").unwrap(), Preset::Standard);
        assert!(Preset::from_str("fast").is_err());
    }

    #[test]
    fn test_preset_serde() {
        let json = serde_json::to_string(&Preset::Permissive).unwrap();
        assert_eq!(json, "\"permissive\"");
        assert_eq!(Preset::default(), Preset::Standard);
    }
}
