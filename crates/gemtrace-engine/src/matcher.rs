use chrono::{NaiveDateTime, TimeDelta};
use gemtrace_types::{MessageRecord, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Policy for request/reply pairing.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Longest request-to-reply gap that still closes a transaction.
    pub reply_window: TimeDelta,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        // The customary SECS T3 reply timeout.
        MatcherConfig {
            reply_window: TimeDelta::seconds(45),
        }
    }
}

/// A transaction id opened while an earlier use was still pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateId {
    pub id: u32,
    pub block_index: usize,
    pub timestamp: NaiveDateTime,
}

/// Everything one matching pass produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Transactions in opening order; unanswered ones stay orphans.
    pub transactions: Vec<Transaction>,

    /// Protocol violations observed while opening.
    pub duplicate_ids: Vec<DuplicateId>,
}

/// Pair records sharing a transaction id into request/reply transactions.
///
/// Single pass over time-ordered records. A record closes the earliest
/// pending transaction carrying its id whose opener traveled in the
/// opposite direction and whose age is inside the reply window; otherwise
/// it opens a new pending transaction. A closed transaction is never
/// reopened, so id reuse after closure starts a fresh pair, and a reply
/// that arrives too late surfaces as its own orphan instead of closing
/// the stale request.
pub fn match_transactions(records: &[MessageRecord], config: &MatcherConfig) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    // id -> indices into outcome.transactions, oldest first.
    let mut pending: HashMap<u32, VecDeque<usize>> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let Some(id) = record.transaction_id else {
            continue;
        };

        let mut closed = false;
        if let Some(queue) = pending.get_mut(&id) {
            let position = queue.iter().position(|&txn_index| {
                let txn = &outcome.transactions[txn_index];
                let opener = &records[txn.request_index];
                opener.direction.complement() == record.direction
                    && record.timestamp - txn.opened_at <= config.reply_window
            });
            if let Some(position) = position
                && let Some(txn_index) = queue.remove(position)
            {
                let txn = &mut outcome.transactions[txn_index];
                txn.reply_index = Some(index);
                txn.closed_at = Some(record.timestamp);
                txn.round_trip_us = (record.timestamp - txn.opened_at).num_microseconds();
                closed = true;
            }
        }
        if closed {
            continue;
        }

        let queue = pending.entry(id).or_default();
        if !queue.is_empty() {
            outcome.duplicate_ids.push(DuplicateId {
                id,
                block_index: record.block_index,
                timestamp: record.timestamp,
            });
        }
        queue.push_back(outcome.transactions.len());
        outcome.transactions.push(Transaction {
            id,
            request_index: index,
            opened_at: record.timestamp,
            reply_index: None,
            closed_at: None,
            round_trip_us: None,
        });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gemtrace_types::{Direction, Meaning, MessageFields};

    fn at(offset_secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 11, 14)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + TimeDelta::seconds(offset_secs)
    }

    fn record(
        block_index: usize,
        offset_secs: i64,
        message_type: &str,
        direction: Direction,
        id: Option<u32>,
    ) -> MessageRecord {
        MessageRecord {
            block_index,
            timestamp: at(offset_secs),
            direction,
            message_type: message_type.to_string(),
            message_name: Meaning::Unknown(message_type.to_string()),
            transaction_id: id,
            event: None,
            command: None,
            fields: MessageFields::default(),
            remainder: String::new(),
        }
    }

    #[test]
    fn pairs_complementary_directions_within_window() {
        let records = vec![
            record(0, 0, "S6F11", Direction::EquipmentToHost, Some(1000)),
            record(1, 2, "S6F12", Direction::HostToEquipment, Some(1000)),
        ];
        let outcome = match_transactions(&records, &MatcherConfig::default());

        assert_eq!(outcome.transactions.len(), 1);
        assert!(outcome.duplicate_ids.is_empty());

        let txn = &outcome.transactions[0];
        assert_eq!(txn.id, 1000);
        assert_eq!(txn.request_index, 0);
        assert_eq!(txn.reply_index, Some(1));
        assert_eq!(txn.round_trip_us, Some(2_000_000));
        assert!(!txn.is_orphan());
    }

    #[test]
    fn same_direction_reuse_is_flagged_and_fifo_closes_oldest() {
        let records = vec![
            record(0, 0, "S6F11", Direction::EquipmentToHost, Some(7)),
            record(1, 1, "S6F11", Direction::EquipmentToHost, Some(7)),
            record(2, 2, "S6F12", Direction::HostToEquipment, Some(7)),
        ];
        let outcome = match_transactions(&records, &MatcherConfig::default());

        assert_eq!(outcome.duplicate_ids.len(), 1);
        assert_eq!(outcome.duplicate_ids[0].id, 7);
        assert_eq!(outcome.duplicate_ids[0].block_index, 1);

        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.transactions[0].reply_index, Some(2));
        assert!(outcome.transactions[1].is_orphan());
    }

    #[test]
    fn late_reply_orphans_both_halves() {
        let records = vec![
            record(0, 0, "S2F49", Direction::HostToEquipment, Some(9)),
            record(1, 60, "S2F50", Direction::EquipmentToHost, Some(9)),
        ];
        let outcome = match_transactions(&records, &MatcherConfig::default());

        assert_eq!(outcome.transactions.len(), 2);
        assert!(outcome.transactions[0].is_orphan());
        assert!(outcome.transactions[1].is_orphan());
        // The late reply re-opened an id that never stopped pending.
        assert_eq!(outcome.duplicate_ids.len(), 1);
    }

    #[test]
    fn closed_ids_reopen_as_fresh_transactions() {
        let records = vec![
            record(0, 0, "S6F11", Direction::EquipmentToHost, Some(5)),
            record(1, 1, "S6F12", Direction::HostToEquipment, Some(5)),
            record(2, 10, "S6F11", Direction::EquipmentToHost, Some(5)),
            record(3, 11, "S6F12", Direction::HostToEquipment, Some(5)),
        ];
        let outcome = match_transactions(&records, &MatcherConfig::default());

        assert!(outcome.duplicate_ids.is_empty());
        assert_eq!(outcome.transactions.len(), 2);
        // Each record closes at most one transaction, oldest first.
        assert_eq!(outcome.transactions[0].reply_index, Some(1));
        assert_eq!(outcome.transactions[1].reply_index, Some(3));
    }

    #[test]
    fn shorter_window_rejects_slow_replies() {
        let records = vec![
            record(0, 0, "S6F11", Direction::EquipmentToHost, Some(3)),
            record(1, 2, "S6F12", Direction::HostToEquipment, Some(3)),
        ];
        let config = MatcherConfig {
            reply_window: TimeDelta::seconds(1),
        };
        let outcome = match_transactions(&records, &config);

        assert_eq!(outcome.transactions.len(), 2);
        assert!(outcome.transactions.iter().all(|t| t.is_orphan()));
    }

    #[test]
    fn records_without_ids_are_ignored() {
        let records = vec![
            record(0, 0, "S6F11", Direction::EquipmentToHost, None),
            record(1, 1, "S6F12", Direction::HostToEquipment, None),
        ];
        let outcome = match_transactions(&records, &MatcherConfig::default());
        assert!(outcome.transactions.is_empty());
        assert!(outcome.duplicate_ids.is_empty());
    }
}
