use chrono::NaiveDateTime;
use gemtrace_types::{Direction, Error, LOG_TIMESTAMP_FORMAT, RawMessageBlock, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Start-of-block line: `timestamp,[channel],header`.
static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}\.\d+),\[([^\]]+)\],(.*)$").unwrap()
});

/// Message type, written either `Message=EventReportSend:'S6F11'` or
/// `MessageName=S6F11` depending on firmware version.
static MESSAGE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Message=.*?:'(\w+)'|MessageName=(\w+)").unwrap());

static SYSTEM_BYTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SystemBytes=(\d+)").unwrap());

/// Split raw log text into message blocks.
///
/// Only `Core:Send` (host to equipment) and `Core:Receive` (equipment to
/// host) channel lines open a block; every other line is skipped. A block's
/// body is the run of following lines whose first non-blank character is
/// `<`, ended by a line consisting solely of `.`. Blocks without a body are
/// kept with an empty one, since acknowledge messages still matter for
/// transaction pairing.
///
/// Returns `Error::NoMessages` when no block is found at all, the single
/// condition that halts the pipeline.
pub fn segment(input: &str) -> Result<Vec<RawMessageBlock>> {
    let lines: Vec<&str> = input.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(header) = parse_header(lines[i].trim()) else {
            i += 1;
            continue;
        };

        let mut body_lines: Vec<&str> = Vec::new();
        let mut j = i + 1;
        if j < lines.len() && lines[j].trim().starts_with('<') {
            while j < lines.len() && lines[j].trim() != "." {
                body_lines.push(lines[j].trim());
                j += 1;
            }
            if j < lines.len() {
                j += 1; // the `.` terminator
            }
        }

        blocks.push(RawMessageBlock {
            index: blocks.len(),
            timestamp: header.timestamp,
            direction: header.direction,
            message_type: header.message_type,
            system_bytes: header.system_bytes,
            body: body_lines.join("\n"),
        });
        i = j;
    }

    if blocks.is_empty() {
        return Err(Error::NoMessages);
    }
    Ok(blocks)
}

struct Header {
    timestamp: NaiveDateTime,
    direction: Direction,
    message_type: String,
    system_bytes: Option<u32>,
}

fn parse_header(line: &str) -> Option<Header> {
    let caps = HEADER_LINE.captures(line)?;
    let channel = caps.get(2)?.as_str();

    let direction = if channel.contains("Core:Send") {
        Direction::HostToEquipment
    } else if channel.contains("Core:Receive") {
        Direction::EquipmentToHost
    } else {
        return None;
    };

    // The regex fixes the shape; chrono still rejects impossible dates.
    let timestamp =
        NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), LOG_TIMESTAMP_FORMAT).ok()?;

    let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("");
    let message_type = MESSAGE_TYPE
        .captures(rest)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "N/A".to_string());

    let system_bytes = SYSTEM_BYTES
        .captures(rest)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    Some(Header {
        timestamp,
        direction,
        message_type,
        system_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
2023/11/14 10:30:00.000100,[Core:Receive],Message=EventReportSend:'S6F11' SystemBytes=1001
<L [3]
  <U4 [1] 181>
  <U1 [1] 2>
  <A [8] 'MAG-0042'>
>
.
2023/11/14 10:30:00.104200,[Debug],internal state dump
2023/11/14 10:30:00.204500,[Core:Send],MessageName=S6F12 SystemBytes=1001
<B [1] 0x0>
.
2023/11/14 10:30:05.000000,[Core:Send],Message=RemoteCommand:'S2F49' SystemBytes=1002
";

    #[test]
    fn splits_blocks_and_spans_bodies() {
        let blocks = segment(SAMPLE).unwrap();
        assert_eq!(blocks.len(), 3);

        assert_eq!(blocks[0].index, 0);
        assert_eq!(blocks[0].message_type, "S6F11");
        assert_eq!(blocks[0].direction, Direction::EquipmentToHost);
        assert_eq!(blocks[0].system_bytes, Some(1001));
        assert!(blocks[0].body.contains("'MAG-0042'"));
        assert_eq!(blocks[0].body.lines().count(), 5);

        // MessageName= form, body present.
        assert_eq!(blocks[1].message_type, "S6F12");
        assert_eq!(blocks[1].direction, Direction::HostToEquipment);
        assert_eq!(blocks[1].body, "<B [1] 0x0>");

        // Header with no body still yields a block.
        assert_eq!(blocks[2].message_type, "S2F49");
        assert_eq!(blocks[2].body, "");
        assert_eq!(blocks[2].system_bytes, Some(1002));
    }

    #[test]
    fn timestamps_keep_microseconds() {
        let blocks = segment(SAMPLE).unwrap();
        let rendered = blocks[1]
            .timestamp
            .format("%Y/%m/%d %H:%M:%S%.6f")
            .to_string();
        assert_eq!(rendered, "2023/11/14 10:30:00.204500");
    }

    #[test]
    fn non_core_channels_are_skipped() {
        let input = "\
2023/11/14 10:30:00.000100,[Debug],noise
2023/11/14 10:30:00.000200,[Trace:Driver],more noise
";
        assert!(matches!(segment(input), Err(Error::NoMessages)));
    }

    #[test]
    fn empty_input_is_no_messages() {
        assert!(matches!(segment(""), Err(Error::NoMessages)));
        assert!(matches!(segment("\n\n\n"), Err(Error::NoMessages)));
    }

    #[test]
    fn missing_terminator_runs_to_end_of_input() {
        let input = "\
2023/11/14 10:30:00.000100,[Core:Receive],MessageName=S6F11
<L [2]
  <U4 [1] 120>
";
        let blocks = segment(input).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "<L [2]\n<U4 [1] 120>");
    }
}
