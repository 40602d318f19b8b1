use crate::rules::{RuleContext, RuleSet};
use crate::scanner::BodyScanner;
use crate::segment;
use gemtrace_kb::KnowledgeBase;
use gemtrace_types::{MessageFields, MessageRecord, RawMessageBlock, Result};

/// Turns raw message blocks into structured records by running the
/// registered extraction rule for each block's message type.
pub struct Extractor<'a> {
    kb: &'a KnowledgeBase,
    rules: RuleSet,
}

impl<'a> Extractor<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Extractor {
            kb,
            rules: RuleSet::standard(),
        }
    }

    /// Build an extractor with a caller-supplied rule registry.
    pub fn with_rules(kb: &'a KnowledgeBase, rules: RuleSet) -> Self {
        Extractor { kb, rules }
    }

    /// Extract one block. Never fails: fields no rule recognizes stay
    /// unset, and body text no rule consumes lands in the remainder.
    pub fn extract(&self, block: &RawMessageBlock) -> MessageRecord {
        let mut record = MessageRecord {
            block_index: block.index,
            timestamp: block.timestamp,
            direction: block.direction,
            message_type: block.message_type.clone(),
            message_name: self.kb.message_name(&block.message_type),
            transaction_id: block.system_bytes,
            event: None,
            command: None,
            fields: MessageFields::default(),
            remainder: String::new(),
        };

        let mut scanner = BodyScanner::new(&block.body);
        let ctx = RuleContext {
            kb: self.kb,
            rules: &self.rules,
        };
        if let Some(rule) = self.rules.rule_for(&block.message_type) {
            rule(&mut scanner, &ctx, &mut record);
        }
        record.remainder = scanner.remainder();
        record
    }

    pub fn extract_all(&self, blocks: &[RawMessageBlock]) -> Vec<MessageRecord> {
        blocks.iter().map(|block| self.extract(block)).collect()
    }
}

/// Segment a raw log and extract every block, in source order.
///
/// The only error is an input with no message blocks at all; individual
/// malformed bodies degrade to records with unparsed remainders.
pub fn parse_log(input: &str, kb: &KnowledgeBase) -> Result<Vec<MessageRecord>> {
    let blocks = segment::segment(input)?;
    Ok(Extractor::new(kb).extract_all(&blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemtrace_types::{Direction, Error, Meaning};

    const SAMPLE: &str = "\
2023/11/14 10:29:00.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=1000
<L [3]
<U4 [1] 181>
<U1 [1] 2>
<L [3]
<A [14] '20231114102900'>
<A [8] 'MAG-0042'>
<A [4] 'OP07'>
>
>
.
2023/11/14 10:30:00.100000,[Core:Receive],Message=34:'S6F11' SystemBytes=1001
<L [3]
<U4 [1] 5002>
<U4 [1] 141>
<L [2]
<U1 [1] 2>
<A [3] 'MIC'>
>
>
.
2023/11/14 10:30:05.304500,[Core:Send],Message=34:'S6F12' SystemBytes=1001
.
2023/11/14 10:31:00.000000,[Core:Send],Message=35:'S2F49' SystemBytes=1002
<L [4]
<U4 [1] 10>
<A [6] 'LOADER'>
<A [9] 'LOADSTART'>
<L [2]
<L [2]
<A [5] 'LOTID'>
<A [7] 'LOT-001'>
>
<L [2]
<A [6] 'PORTID'>
<A [1] '2'>
>
>
>
.
2023/11/14 10:32:10.500000,[Core:Receive],Message=36:'S5F1' SystemBytes=1003
<L [3]
<B [1] 0x84>
<U4 [1] 1002>
<A [14] 'VACUUM FAILURE'>
>
.
2023/11/14 10:33:00.250000,[Core:Receive],MessageName=S6F11 SystemBytes=1004
<L [3]
<U4 [1] 5003>
<U4 [1] 120>
<L [6]
<A [16] '2023111410330025'>
<A [7] 'LOT-001'>
<A [6] 'PNL-A1'>
<A [1] 'F'>
<A [1] '0'>
<A [7] 'Slot 12'>
>
>
.
";

    fn parsed() -> Vec<MessageRecord> {
        let kb = KnowledgeBase::builtin();
        parse_log(SAMPLE, &kb).unwrap()
    }

    #[test]
    fn magazine_docked_positional_fields() {
        let records = parsed();
        let record = &records[0];

        assert_eq!(record.block_index, 0);
        assert_eq!(record.direction, Direction::EquipmentToHost);
        assert!(record.is_event("MagazineDocked"));
        assert_eq!(record.event.as_ref().unwrap().code, 181);
        assert_eq!(record.transaction_id, Some(1000));
        assert_eq!(record.fields.port_id, Some(2));
        assert_eq!(record.fields.magazine_id.as_deref(), Some("MAG-0042"));
        assert_eq!(record.fields.operator_id.as_deref(), Some("OP07"));

        let clock = record.fields.body_clock.unwrap();
        assert_eq!(clock.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-11-14 10:29:00");
    }

    #[test]
    fn port_status_change_pairs_id_and_state() {
        let records = parsed();
        let record = &records[1];

        assert!(record.is_event("PortStatusChange"));
        assert_eq!(record.fields.port_id, Some(2));
        assert_eq!(record.fields.port_state.as_deref(), Some("MIC"));

        // The DATAID stays in the remainder; consumed items do not.
        assert!(record.remainder.contains("5002"));
        assert!(!record.remainder.contains("MIC"));
        assert!(!record.remainder.contains("141"));
    }

    #[test]
    fn acknowledge_has_no_body_and_shares_transaction_id() {
        let records = parsed();
        let record = &records[2];

        assert_eq!(record.message_type, "S6F12");
        assert_eq!(record.message_name, Meaning::Known("Event Report Acknowledge".to_string()));
        assert_eq!(record.direction, Direction::HostToEquipment);
        assert_eq!(record.transaction_id, Some(1001));
        assert!(record.fields.is_empty());
        assert!(record.remainder.is_empty());
    }

    #[test]
    fn remote_command_validates_rcmd_against_table() {
        let records = parsed();
        let record = &records[3];

        // 'LOADER' also matches the token shape but is not a known
        // command, so the scan keeps going.
        assert_eq!(record.command.as_deref(), Some("LOADSTART"));
        assert_eq!(record.fields.lot_id.as_deref(), Some("LOT-001"));
        assert_eq!(record.fields.port_id, Some(2));
        assert!(record.remainder.contains("LOADER"));
        assert!(!record.remainder.contains("LOTID"));
    }

    #[test]
    fn alarm_report_reads_alcd_bit_and_body_text() {
        let records = parsed();
        let record = &records[4];

        assert_eq!(record.fields.alarm_set, Some(true));
        assert_eq!(record.fields.alarm_id, Some(1002));
        // Body text wins over the knowledge-base description.
        assert_eq!(
            record.fields.alarm_text,
            Some(Meaning::Known("VACUUM FAILURE".to_string()))
        );
    }

    #[test]
    fn id_read_takes_quoted_fields_in_order() {
        let records = parsed();
        let record = &records[5];

        assert!(record.is_event("IDRead"));
        assert_eq!(record.fields.lot_id.as_deref(), Some("LOT-001"));
        assert_eq!(record.fields.panel_id.as_deref(), Some("PNL-A1"));
        assert_eq!(record.fields.orientation.as_deref(), Some("F"));
        assert_eq!(record.fields.slot_info.as_deref(), Some("Slot 12"));

        let read = record.fields.id_read.as_ref().unwrap();
        assert_eq!(read.code, "0");
        assert!(!read.is_failure());
        assert_eq!(read.meaning, Meaning::Known("Success (OK)".to_string()));

        // The leading quoted field is the equipment clock, with two
        // fractional digits carrying centiseconds.
        let clock = record.fields.body_clock.unwrap();
        assert_eq!(clock.format("%H:%M:%S%.3f").to_string(), "10:33:00.250");
    }

    #[test]
    fn unknown_message_type_keeps_body_in_remainder() {
        let kb = KnowledgeBase::builtin();
        let input = "\
2023/11/14 10:40:00.000000,[Core:Receive],Message=99:'S99F99' SystemBytes=2000
<L [1]
<A [4] 'DATA'>
>
.
";
        let records = parse_log(input, &kb).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message_name, Meaning::Unknown("S99F99".to_string()));
        assert!(records[0].fields.is_empty());
        assert_eq!(records[0].remainder, "<L [1] <A [4] 'DATA'> >");
    }

    #[test]
    fn garbage_body_degrades_to_remainder() {
        let kb = KnowledgeBase::builtin();
        let input = "\
2023/11/14 10:41:00.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=2001
<UNPARSEABLE NOISE
.
";
        let records = parse_log(input, &kb).unwrap();
        assert!(records[0].event.is_none());
        assert_eq!(records[0].remainder, "<UNPARSEABLE NOISE");
    }

    #[test]
    fn empty_input_is_the_only_error() {
        let kb = KnowledgeBase::builtin();
        assert!(matches!(parse_log("", &kb), Err(Error::NoMessages)));
        assert!(matches!(
            parse_log("no headers here\njust text\n", &kb),
            Err(Error::NoMessages)
        ));
    }
}
