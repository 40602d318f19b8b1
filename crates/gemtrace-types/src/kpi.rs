use crate::util::format_duration_us;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to the record anchoring one end of a KPI interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub block_index: usize,
    pub timestamp: NaiveDateTime,
}

/// Outcome of a KPI computation.
///
/// A missing endpoint or an empty divisor yields `Unavailable` with a
/// stated reason rather than zero or an error, so reporting can say
/// "not determinable" instead of showing a misleading number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KpiOutcome {
    Measured { duration_us: i64 },
    Unavailable { reason: String },
}

impl KpiOutcome {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        KpiOutcome::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn duration_us(&self) -> Option<i64> {
        match self {
            KpiOutcome::Measured { duration_us } => Some(*duration_us),
            KpiOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, KpiOutcome::Measured { .. })
    }
}

impl fmt::Display for KpiOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiOutcome::Measured { duration_us } => {
                write!(f, "{}", format_duration_us(*duration_us))
            }
            KpiOutcome::Unavailable { reason } => write!(f, "not determinable ({})", reason),
        }
    }
}

/// A named timing metric derived from designated start/end event pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiResult {
    /// Metric name, e.g. `TotalCycleTime`.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventRef>,

    pub outcome: KpiOutcome,
}
