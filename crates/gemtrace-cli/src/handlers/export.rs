use crate::context::ExecutionContext;
use crate::session_loader::load_report;
use crate::types::ExportFormat;
use anyhow::{Context, Result};
use gemtrace_engine::AnalysisOptions;
use gemtrace_types::{MessageRecord, SessionReport, format_timestamp};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

// One column per record field, in schema order, plus the narrator's
// description and the remainder catch-all at the end.
const CSV_HEADER: [&str; 26] = [
    "Block",
    "Timestamp",
    "Direction",
    "MessageType",
    "MessageName",
    "TransactionID",
    "Event",
    "Command",
    "EventDescription",
    "BodyClock",
    "PortID",
    "PortState",
    "MagazineID",
    "OperatorID",
    "LotID",
    "PanelID",
    "SlotInfo",
    "SrcPortID",
    "DestPortID",
    "Orientation",
    "AlarmID",
    "AlarmState",
    "AlarmText",
    "IDReadResult",
    "StatusVariable",
    "Remainder",
];

pub fn handle(
    ctx: &ExecutionContext,
    file: &Path,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let report = load_report(ctx, file, &AnalysisOptions::default())?;

    match output {
        Some(path) => {
            let out = fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_report(&report, format, out)?;
            println!("Exported {} records to {}", report.records.len(), path.display());
        }
        None => write_report(&report, format, std::io::stdout())?,
    }

    Ok(())
}

fn write_report<W: Write>(report: &SessionReport, format: ExportFormat, out: W) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(report, out),
        ExportFormat::Text => write_text(report, out),
        ExportFormat::Json => write_json(report, out),
    }
}

fn write_csv<W: Write>(report: &SessionReport, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(CSV_HEADER)?;

    // The narrator emits exactly one entry per record, in record order.
    for (record, entry) in report.records.iter().zip(&report.narrative) {
        wtr.write_record(csv_row(record, &entry.text))?;
    }

    wtr.flush()?;
    Ok(())
}

fn csv_row(record: &MessageRecord, description: &str) -> [String; 26] {
    let fields = &record.fields;
    [
        record.block_index.to_string(),
        format_timestamp(&record.timestamp),
        record.direction.to_string(),
        record.message_type.clone(),
        record.message_name.to_string(),
        opt_string(record.transaction_id),
        record
            .event
            .as_ref()
            .map(|e| e.name.to_string())
            .unwrap_or_default(),
        record.command.clone().unwrap_or_default(),
        description.to_string(),
        fields
            .body_clock
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_default(),
        opt_string(fields.port_id),
        fields.port_state.clone().unwrap_or_default(),
        fields.magazine_id.clone().unwrap_or_default(),
        fields.operator_id.clone().unwrap_or_default(),
        fields.lot_id.clone().unwrap_or_default(),
        fields.panel_id.clone().unwrap_or_default(),
        fields.slot_info.clone().unwrap_or_default(),
        opt_string(fields.source_port_id),
        opt_string(fields.destination_port_id),
        fields.orientation.clone().unwrap_or_default(),
        opt_string(fields.alarm_id),
        fields
            .alarm_set
            .map(|set| if set { "AlarmSet" } else { "AlarmClear" }.to_string())
            .unwrap_or_default(),
        fields
            .alarm_text
            .as_ref()
            .map(|text| text.to_string())
            .unwrap_or_default(),
        fields
            .id_read
            .as_ref()
            .map(|read| read.meaning.to_string())
            .unwrap_or_default(),
        fields
            .status_variable
            .as_ref()
            .map(|sv| format!("{}={}", sv.name, sv.value))
            .unwrap_or_default(),
        record.remainder.clone(),
    ]
}

fn opt_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_text<W: Write>(report: &SessionReport, mut out: W) -> Result<()> {
    writeln!(out, "EQUIPMENT SESSION REPORT - CHRONOLOGICAL WALKTHROUGH")?;
    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out, "Verdict: {} (priority: {})", report.verdict, report.priority)?;
    writeln!(out, "{}", report.summary.headline)?;
    writeln!(out)?;

    writeln!(out, "Key Performance Indicators:")?;
    for kpi in &report.kpis {
        writeln!(out, "- {}: {}", kpi.name, kpi.outcome)?;
    }

    if !report.findings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Findings:")?;
        for finding in &report.findings {
            writeln!(out, "- ({}) {}", finding.kind, finding.detail)?;
        }
    }

    writeln!(out)?;
    for entry in &report.narrative {
        writeln!(out, "[{}] {}", format_timestamp(&entry.timestamp), entry.text)?;
    }

    Ok(())
}

fn write_json<W: Write>(report: &SessionReport, mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemtrace_engine::build_report;
    use gemtrace_kb::KnowledgeBase;
    use gemtrace_parser::parse_log;

    const DOCK_LOG: &str = "\
2023/11/14 10:00:00.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=9001
<L [3]
<U4 [1] 181>
<U1 [1] 2>
<L [3]
<A [14] '20231114100000'>
<A [8] 'MAG-0042'>
<A [4] 'OP07'>
>
>
.
";

    fn fixture_report() -> SessionReport {
        let kb = KnowledgeBase::builtin();
        let records = parse_log(DOCK_LOG, &kb).unwrap();
        build_report(
            "fixture".to_string(),
            records,
            &kb,
            &AnalysisOptions::default(),
        )
    }

    #[test]
    fn csv_has_one_row_per_record_plus_header() {
        let report = fixture_report();
        let mut buf = Vec::new();
        write_csv(&report, &mut buf).unwrap();

        let rendered = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), report.records.len() + 1);
        assert!(lines[0].starts_with("Block,Timestamp,Direction,"));
        assert!(lines[1].contains("MAG-0042"));
        assert!(lines[1].contains("Equipment->Host"));
    }

    #[test]
    fn csv_description_column_carries_the_narration() {
        let report = fixture_report();
        let mut buf = Vec::new();
        write_csv(&report, &mut buf).unwrap();

        let rendered = String::from_utf8(buf).unwrap();
        assert!(rendered.contains("Magazine 'MAG-0042' docked at Port 2 by Operator 'OP07'."));
    }

    #[test]
    fn text_report_lists_kpis_and_walkthrough_lines() {
        let report = fixture_report();
        let mut buf = Vec::new();
        write_text(&report, &mut buf).unwrap();

        let rendered = String::from_utf8(buf).unwrap();
        assert!(rendered.contains("Verdict: Golden Run (priority: normal)"));
        assert!(rendered.contains("- TotalCycleTime: not determinable"));
        assert!(rendered.contains("[2023/11/14 10:00:00.000000] Magazine 'MAG-0042'"));
    }

    #[test]
    fn json_export_is_the_full_report() {
        let report = fixture_report();
        let mut buf = Vec::new();
        write_json(&report, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["fingerprint"], "fixture");
        assert_eq!(value["verdict"], "golden_run");
        assert_eq!(value["records"].as_array().unwrap().len(), 1);
    }
}
