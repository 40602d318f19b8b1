use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A correlated request/reply pair of messages sharing a transaction
/// identifier, or the unanswered half of one.
///
/// Once closed (both halves seen) a transaction is never reopened; a later
/// message reusing the identifier opens a distinct transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// System-bytes transaction identifier shared by both halves.
    pub id: u32,

    /// Index of the opening record in the record sequence.
    pub request_index: usize,

    pub opened_at: NaiveDateTime,

    /// Index of the closing record; `None` for an orphan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<NaiveDateTime>,

    /// Reply latency in microseconds, when the pair closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip_us: Option<i64>,
}

impl Transaction {
    pub fn is_orphan(&self) -> bool {
        self.reply_index.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(secs: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 0, secs)
            .unwrap()
    }

    #[test]
    fn orphan_has_no_reply() {
        let txn = Transaction {
            id: 4242,
            request_index: 0,
            opened_at: at(0),
            reply_index: None,
            closed_at: None,
            round_trip_us: None,
        };
        assert!(txn.is_orphan());

        let closed = Transaction {
            reply_index: Some(1),
            closed_at: Some(at(2)),
            round_trip_us: Some(2_000_000),
            ..txn
        };
        assert!(!closed.is_orphan());
    }
}
