// Engine module - Session analysis over parsed records
// This layer sits between parsed records (types) and CLI presentation

pub mod anomaly;
pub mod kpi;
pub mod matcher;
pub mod narrator;
pub mod report;
pub mod summary;

pub use kpi::{EventPredicate, KpiCalculator, KpiDefinition};
pub use matcher::{DuplicateId, MatchOutcome, MatcherConfig, match_transactions};
pub use narrator::{EventNarrator, ExpectedSequence, SequenceStep, StepTrigger};
pub use report::{AnalysisOptions, build_report};

use gemtrace_kb::KnowledgeBase;
use gemtrace_types::{MessageRecord, SessionReport};

// Façade API - Stable public interface for CLI layer
// CLI should use these functions instead of directly accessing internal modules

/// Analyze a parsed session end to end under default options.
pub fn analyze(
    fingerprint: String,
    records: Vec<MessageRecord>,
    kb: &KnowledgeBase,
) -> SessionReport {
    build_report(fingerprint, records, kb, &AnalysisOptions::default())
}
