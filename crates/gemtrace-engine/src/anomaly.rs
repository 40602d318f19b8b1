use crate::matcher::MatchOutcome;
use gemtrace_kb::{KnowledgeBase, expected_identifiers};
use gemtrace_types::{AnomalyFinding, AnomalyKind, MessageRecord};

/// Scan records and pairing results for session deviations.
///
/// Record-level findings come first in record order, then unanswered
/// transactions, then duplicate-id violations. Everything is reported;
/// severity ranking is the summarizer's job.
pub fn detect(
    records: &[MessageRecord],
    outcome: &MatchOutcome,
    kb: &KnowledgeBase,
) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();

    for record in records {
        if let Some(set) = record.fields.alarm_set {
            findings.push(alarm_finding(record, set, kb));
        }
        if let Some(id_read) = &record.fields.id_read
            && id_read.is_failure()
        {
            let panel = record.fields.panel_id.as_deref().unwrap_or("N/A");
            findings.push(AnomalyFinding {
                kind: AnomalyKind::IdReadFailure,
                block_index: Some(record.block_index),
                timestamp: Some(record.timestamp),
                detail: format!(
                    "panel '{}' read failed with code {} ({})",
                    panel, id_read.code, id_read.meaning
                ),
            });
        }
        if let Some(name) = record.event_name() {
            for key in expected_identifiers(name) {
                if !record.fields.has(*key) {
                    findings.push(AnomalyFinding {
                        kind: AnomalyKind::MissingIdentifier,
                        block_index: Some(record.block_index),
                        timestamp: Some(record.timestamp),
                        detail: format!("{} report did not carry {}", name, key),
                    });
                }
            }
        }
    }

    for txn in outcome.transactions.iter().filter(|t| t.is_orphan()) {
        let opener = &records[txn.request_index];
        findings.push(AnomalyFinding {
            kind: AnomalyKind::OrphanTransaction,
            block_index: Some(opener.block_index),
            timestamp: Some(txn.opened_at),
            detail: format!(
                "transaction {} ({}) never received a reply",
                txn.id, opener.message_type
            ),
        });
    }

    for duplicate in &outcome.duplicate_ids {
        findings.push(AnomalyFinding {
            kind: AnomalyKind::DuplicateTransactionId,
            block_index: Some(duplicate.block_index),
            timestamp: Some(duplicate.timestamp),
            detail: format!("transaction id {} opened while still pending", duplicate.id),
        });
    }

    findings
}

fn alarm_finding(record: &MessageRecord, set: bool, kb: &KnowledgeBase) -> AnomalyFinding {
    let id = record
        .fields
        .alarm_id
        .map_or_else(|| "N/A".to_string(), |v| v.to_string());
    let text = match (&record.fields.alarm_text, record.fields.alarm_id) {
        (Some(text), _) => text.to_string(),
        (None, Some(alid)) => kb.alarm_text(alid).to_string(),
        (None, None) => "Unknown Alarm".to_string(),
    };
    let (kind, verb) = if set {
        (AnomalyKind::AlarmRaised, "raised")
    } else {
        (AnomalyKind::AlarmCleared, "cleared")
    };
    AnomalyFinding {
        kind,
        block_index: Some(record.block_index),
        timestamp: Some(record.timestamp),
        detail: format!("alarm {} ({}) was {}", id, text, verb),
    }
}
