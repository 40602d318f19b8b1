use gemtrace_engine::analyze;
use gemtrace_kb::KnowledgeBase;
use gemtrace_parser::parse_log;
use gemtrace_types::{AnomalyKind, KpiOutcome, SessionReport, Severity, Verdict};

// Raw-text fixtures run the whole stack: segmentation, extraction,
// pairing, narration, KPIs, findings, verdict.
fn analyze_log(input: &str) -> SessionReport {
    let kb = KnowledgeBase::builtin();
    let records = parse_log(input, &kb).expect("fixture should contain message blocks");
    analyze("sha256:fixture".to_string(), records, &kb)
}

const GOLDEN_CYCLE: &str = "\
2023/11/14 10:00:00.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=2001
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
2023/11/14 10:00:00.050000,[Core:Send],Message=34:'S6F12' SystemBytes=2001
2023/11/14 10:01:00.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=2002
<L [3]
<U4 [1] 5002>
<U4 [1] 141>
<L [2]
<U1 [1] 2>
<A [3] 'MIC'>
>
>
.
2023/11/14 10:01:00.050000,[Core:Send],Message=34:'S6F12' SystemBytes=2002
2023/11/14 10:01:48.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=2003
<L [2]
<U4 [1] 5003>
<U4 [1] 136>
>
.
2023/11/14 10:01:48.050000,[Core:Send],Message=34:'S6F12' SystemBytes=2003
2023/11/14 10:02:00.000000,[Core:Send],Message=35:'S2F49' SystemBytes=2004
<L [4]
<U4 [1] 10>
<A [6] 'EQUIPA'>
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
2023/11/14 10:02:00.050000,[Core:Receive],Message=35:'S2F50' SystemBytes=2004
<L [2]
<B [1] 0x0>
<L [0]>
>
.
2023/11/14 10:02:10.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=2005
<L [3]
<U4 [1] 5004>
<U4 [1] 120>
<L [6]
<A [14] '20231114100210'>
<A [7] 'LOT-001'>
<A [6] 'PNL-A1'>
<A [1] 'F'>
<A [1] '0'>
<A [7] 'Slot 12'>
>
>
.
2023/11/14 10:02:10.050000,[Core:Send],Message=34:'S6F12' SystemBytes=2005
2023/11/14 10:02:20.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=2006
<L [3]
<U4 [1] 5005>
<U4 [1] 120>
<L [6]
<A [14] '20231114100220'>
<A [7] 'LOT-001'>
<A [6] 'PNL-A2'>
<A [1] 'F'>
<A [1] '0'>
<A [7] 'Slot 13'>
>
>
.
2023/11/14 10:02:20.050000,[Core:Send],Message=34:'S6F12' SystemBytes=2006
2023/11/14 10:07:00.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=2007
<L [2]
<U4 [1] 5006>
<U4 [1] 131>
>
.
2023/11/14 10:07:00.050000,[Core:Send],Message=34:'S6F12' SystemBytes=2007
";

const FAULT_SESSION: &str = "\
2023/11/14 10:00:00.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=3001
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
2023/11/14 10:00:00.050000,[Core:Send],Message=34:'S6F12' SystemBytes=3001
2023/11/14 10:03:30.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=3002
<L [3]
<U4 [1] 5007>
<U4 [1] 102>
<U4 [1] 204>
>
.
2023/11/14 10:03:30.050000,[Core:Send],Message=34:'S6F12' SystemBytes=3002
";

const ORPHANED_COMMAND: &str = "\
2023/11/14 10:00:00.000000,[Core:Receive],Message=34:'S6F11' SystemBytes=4000
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
2023/11/14 10:00:00.050000,[Core:Send],Message=34:'S6F12' SystemBytes=4000
2023/11/14 10:02:00.000000,[Core:Send],Message=35:'S2F49' SystemBytes=4001
<L [4]
<U4 [1] 10>
<A [6] 'EQUIPA'>
<A [9] 'LOADSTART'>
<L [0]>
>
.
";

#[test]
fn golden_cycle_measures_every_kpi() {
    let report = analyze_log(GOLDEN_CYCLE);

    assert_eq!(report.verdict, Verdict::GoldenRun);
    assert!(!report.is_fault());
    assert!(report.findings.is_empty(), "findings: {:?}", report.findings);

    let kpi = |name: &str| {
        report
            .kpis
            .iter()
            .find(|k| k.name == name)
            .unwrap_or_else(|| panic!("missing KPI {name}"))
    };
    assert_eq!(
        kpi("TotalCycleTime").outcome,
        KpiOutcome::Measured {
            duration_us: 300_000_000
        }
    );
    assert_eq!(
        kpi("MappingTime").outcome,
        KpiOutcome::Measured {
            duration_us: 48_000_000
        }
    );
    // 300 s over panels PNL-A1 and PNL-A2.
    assert_eq!(
        kpi("AverageTimePerPanel").outcome,
        KpiOutcome::Measured {
            duration_us: 150_000_000
        }
    );
}

#[test]
fn golden_cycle_pairs_every_transaction() {
    let report = analyze_log(GOLDEN_CYCLE);

    assert_eq!(report.transactions.len(), 7);
    assert_eq!(report.orphan_count(), 0);
    assert_eq!(report.transactions[0].id, 2001);
    assert_eq!(report.transactions[0].round_trip_us, Some(50_000));
}

#[test]
fn golden_cycle_narrates_in_order_without_warnings() {
    let report = analyze_log(GOLDEN_CYCLE);

    assert_eq!(report.narrative.len(), report.records.len());
    assert!(
        report
            .narrative
            .iter()
            .all(|entry| entry.severity == Severity::Normal)
    );
    assert_eq!(
        report.narrative[0].text,
        "Magazine 'MAG-0042' docked at Port 2 by Operator 'OP07'."
    );

    let entities = &report.summary.entities;
    assert_eq!(entities.operators, vec!["OP07"]);
    assert_eq!(entities.lots, vec!["LOT-001"]);
    assert_eq!(entities.panels, vec!["PNL-A1", "PNL-A2"]);
}

#[test]
fn undocumented_alarm_turns_the_session_to_fault() {
    let report = analyze_log(FAULT_SESSION);

    assert_eq!(report.verdict, Verdict::FaultState);
    assert_eq!(
        report.summary.headline,
        "The equipment is in a fault state: 1 alarm was raised during the session."
    );

    let alarms: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.kind == AnomalyKind::AlarmRaised)
        .collect();
    assert_eq!(alarms.len(), 1);
    // ALID 204 is not in the built-in table; the sentinel carries the code.
    assert_eq!(alarms[0].detail, "alarm 204 (Unknown(204)) was raised");

    assert!(
        report
            .narrative
            .iter()
            .any(|entry| entry.severity == Severity::Critical)
    );
    assert_eq!(
        report.summary.action_plan[0],
        "Document the raised alarms and log each occurrence for future reference."
    );
}

#[test]
fn unanswered_command_is_an_orphan_but_not_a_fault() {
    let report = analyze_log(ORPHANED_COMMAND);

    assert_eq!(report.verdict, Verdict::GoldenRun);
    assert_eq!(report.orphan_count(), 1);

    let orphan = report
        .findings
        .iter()
        .find(|f| f.kind == AnomalyKind::OrphanTransaction)
        .expect("orphan finding");
    assert_eq!(orphan.detail, "transaction 4001 (S2F49) never received a reply");

    // Skipping straight to the load command is a sequence deviation.
    assert!(
        report
            .narrative
            .iter()
            .any(|entry| entry.severity == Severity::Warning)
    );
}

#[test]
fn unknown_message_types_flow_through_without_loss() {
    let input = "\
2023/11/14 10:00:00.000000,[Core:Receive],Message=99:'S63F127'
<L [1]
<A [4] 'BLOB'>
>
.
";
    let report = analyze_log(input);

    assert_eq!(report.records.len(), 1);
    assert!(report.records[0].message_name.known().is_none());
    assert!(report.records[0].remainder.contains("'BLOB'"));
    assert_eq!(report.narrative[0].text, "Unknown log entry.");
    assert_eq!(report.verdict, Verdict::GoldenRun);
    assert!(report.transactions.is_empty());
}

#[test]
fn report_serializes_with_a_stable_shape() {
    let report = analyze_log(GOLDEN_CYCLE);
    let value = serde_json::to_value(&report).expect("report serializes");

    assert_eq!(value["fingerprint"], "sha256:fixture");
    assert_eq!(value["verdict"], "golden_run");
    assert_eq!(value["priority"], "normal");
    assert_eq!(value["records"].as_array().unwrap().len(), 14);
    assert_eq!(value["kpis"][0]["outcome"]["status"], "measured");
    assert_eq!(
        value["summary"]["headline"],
        "The process was successful and represents a 'Golden Run'. No alarms were raised."
    );

    let clone: SessionReport = serde_json::from_value(value).expect("report deserializes");
    assert_eq!(clone.verdict, report.verdict);
    assert_eq!(clone.records.len(), report.records.len());
}
