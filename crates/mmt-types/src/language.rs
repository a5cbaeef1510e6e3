//! Language direction of a translation request

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a direction string cannot be parsed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid language direction {0:?}, expected \"<source>-<target>\"")]
pub struct ParseDirectionError(pub String);

/// A source/target language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageDirection {
    /// Source language tag (e.g. "en")
    pub source: String,
    /// Target language tag (e.g. "it")
    pub target: String,
}

impl LanguageDirection {
    /// Create a new direction
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

impl fmt::Display for LanguageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.source, self.target)
    }
}

impl FromStr for LanguageDirection {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, target) = s
            .split_once('>')
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| ParseDirectionError(s.to_string()))?;

        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() {
            return Err(ParseDirectionError(s.to_string()));
        }

        Ok(Self::new(source, target))
    }
}
