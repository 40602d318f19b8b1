use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a narrative entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Normal => write!(f, "normal"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One line of the chronological account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeEntry {
    pub timestamp: NaiveDateTime,

    pub severity: Severity,

    /// Plain-language description of what happened.
    pub text: String,

    /// Index of the originating block in the source file.
    pub block_index: usize,
}
