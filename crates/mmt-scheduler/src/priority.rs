//! Translation priority classes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Urgency of a split; lower value is more urgent
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Interactive requests
    High = 0,
    /// Regular API traffic
    #[default]
    Normal = 1,
    /// Batch and bulk work
    Background = 2,
}

impl Priority {
    /// All classes, most urgent first
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Background];

    /// Number of priority classes
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index of the class (0 = most urgent)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Background => "background",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "background" => Ok(Priority::Background),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}
