use crate::anomaly::detect;
use crate::kpi::KpiCalculator;
use crate::matcher::{MatcherConfig, match_transactions};
use crate::narrator::{EventNarrator, ExpectedSequence};
use crate::summary::summarize;
use gemtrace_kb::KnowledgeBase;
use gemtrace_types::{MessageRecord, SessionReport};

/// Tunable inputs of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub matcher: MatcherConfig,
    pub sequence: ExpectedSequence,
}

/// Run the whole analysis pipeline over parsed records.
///
/// Records are time-ordered first (stable, so equal timestamps keep
/// their input order), then pairing, narration, KPIs, findings, and the
/// verdict are derived in that order. Same input, same report.
pub fn build_report(
    fingerprint: String,
    mut records: Vec<MessageRecord>,
    kb: &KnowledgeBase,
    options: &AnalysisOptions,
) -> SessionReport {
    records.sort_by_key(|record| record.timestamp);

    let outcome = match_transactions(&records, &options.matcher);
    let narrative = EventNarrator::new(options.sequence.clone()).narrate(&records, kb);
    let kpis = KpiCalculator::standard().compute(&records);
    let findings = detect(&records, &outcome, kb);
    let (verdict, priority, session_summary) = summarize(&records, &kpis, &findings);

    SessionReport {
        fingerprint,
        records,
        transactions: outcome.transactions,
        narrative,
        kpis,
        findings,
        verdict,
        priority,
        summary: session_summary,
    }
}
