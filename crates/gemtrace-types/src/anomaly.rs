use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a high-priority finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// An alarm was raised (AlarmSet event or S5F1 with the set bit).
    AlarmRaised,
    /// A previously raised alarm was cleared.
    AlarmCleared,
    /// A panel identifier read completed with a non-success result code.
    IdReadFailure,
    /// A transaction half never saw its complementary message.
    OrphanTransaction,
    /// A transaction identifier was opened while already pending.
    DuplicateTransactionId,
    /// A message-type rule expected an identifier field that was absent.
    MissingIdentifier,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnomalyKind::AlarmRaised => "alarm raised",
            AnomalyKind::AlarmCleared => "alarm cleared",
            AnomalyKind::IdReadFailure => "ID read failure",
            AnomalyKind::OrphanTransaction => "orphan transaction",
            AnomalyKind::DuplicateTransactionId => "duplicate transaction id",
            AnomalyKind::MissingIdentifier => "missing identifier",
        };
        write!(f, "{}", label)
    }
}

impl AnomalyKind {
    /// Whether findings of this kind put the session into a fault state.
    pub fn is_fault(self) -> bool {
        matches!(self, AnomalyKind::AlarmRaised)
    }
}

/// One finding produced by the anomaly detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyFinding {
    pub kind: AnomalyKind,

    /// Originating block, when the finding points at a single record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,

    /// Human-readable description of the finding.
    pub detail: String,
}
