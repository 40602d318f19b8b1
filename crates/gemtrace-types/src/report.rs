use crate::anomaly::AnomalyFinding;
use crate::kpi::KpiResult;
use crate::message::MessageRecord;
use crate::narrative::NarrativeEntry;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall health classification of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// No alarms were raised during the session.
    GoldenRun,
    /// At least one alarm was raised.
    FaultState,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::GoldenRun => write!(f, "Golden Run"),
            Verdict::FaultState => write!(f, "Fault State"),
        }
    }
}

/// Review urgency derived from the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Identifiers observed across the session, deduplicated and sorted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyEntities {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operators: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub magazines: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lots: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panels: Vec<String>,
}

impl KeyEntities {
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
            && self.magazines.is_empty()
            && self.lots.is_empty()
            && self.panels.is_empty()
    }
}

/// Executive summary composed from findings and KPIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// One-line statement of the session outcome.
    pub headline: String,

    /// Who and what the session touched.
    pub entities: KeyEntities,

    /// Recommended follow-up actions, most urgent first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_plan: Vec<String>,

    /// Caveat attached when the input carried no recognizable events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Terminal aggregate of one analysis run.
///
/// NOTE: immutable once built. Renderers and exporters read from it but
/// never write back; re-running the pipeline over the same bytes must
/// reproduce this struct field for field, including `fingerprint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Content hash of the raw input, for idempotency checks.
    pub fingerprint: String,

    /// All records in timestamp order.
    pub records: Vec<MessageRecord>,

    /// Request/reply pairs keyed by transaction id.
    pub transactions: Vec<Transaction>,

    /// Chronological plain-language account.
    pub narrative: Vec<NarrativeEntry>,

    /// Timing metrics, one entry per configured KPI.
    pub kpis: Vec<KpiResult>,

    /// High-priority findings, in detection order.
    pub findings: Vec<AnomalyFinding>,

    pub verdict: Verdict,
    pub priority: Priority,

    pub summary: SessionSummary,
}

impl SessionReport {
    pub fn is_fault(&self) -> bool {
        self.verdict == Verdict::FaultState
    }

    /// Count of transactions that never saw a matching reply.
    pub fn orphan_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.is_orphan()).count()
    }
}
