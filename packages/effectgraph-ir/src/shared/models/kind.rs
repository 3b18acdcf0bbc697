//! Effect kind identifiers
//!
//! A kind is either an exception kind (`IOError`) or a tag kind (`IOEffect`).
//! Kinds are nominal: two kinds are the same iff their names match. The
//! hierarchy between them lives in `features::effect_lattice`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exception or tag kind name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(String);

impl Kind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Effect category
///
/// Exceptions and tags are inferred by the same rules but never mix:
/// every table, hierarchy and violation is per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Exception kinds (`raises` lists)
    Raises,
    /// Tag kinds (`tags` lists)
    Tags,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Raises, Category::Tags];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raises => "raises",
            Self::Tags => "tags",
        }
    }

    /// Noun used in diagnostics ("exception", "tag")
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Raises => "exception",
            Self::Tags => "tag",
        }
    }

    /// Verb used in diagnostics ("raise", "produce")
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Raises => "raise",
            Self::Tags => "produce",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comma-separated kind list for messages
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindList(pub Vec<Kind>);

impl KindList {
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|k| k.as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for KindList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Kind::as_str).collect();
        f.write_str(&names.join(", "))
    }
}
