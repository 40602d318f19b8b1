use gemtrace_types::{SessionReport, Severity, Verdict, format_timestamp};
use owo_colors::OwoColorize;

/// Render a full analysis report to stdout.
///
/// Layout: verdict banner, session counts, KPI block, findings, the
/// chronological walkthrough, key entities, and the action plan. Severity
/// drives the walkthrough colors; raised alarms render red.
pub fn print_report(report: &SessionReport, enable_color: bool) {
    let verdict_label = report.verdict.to_string();
    let verdict_str = if enable_color {
        match report.verdict {
            Verdict::GoldenRun => format!("{}", verdict_label.green().bold()),
            Verdict::FaultState => format!("{}", verdict_label.red().bold()),
        }
    } else {
        verdict_label
    };

    println!("Verdict: {} (priority: {})", verdict_str, report.priority);
    println!("{}", report.summary.headline);
    println!();
    println!("Fingerprint: {}", report.fingerprint);
    println!(
        "Records: {}   Transactions: {} ({} orphaned)",
        report.records.len(),
        report.transactions.len(),
        report.orphan_count()
    );
    println!();

    print_kpis(report, enable_color);
    print_findings(report, enable_color);
    print_walkthrough(report, enable_color);
    print_entities(report, enable_color);
    print_action_plan(report, enable_color);

    if let Some(note) = &report.summary.note {
        println!();
        println!("Note: {}", note);
    }
}

fn print_kpis(report: &SessionReport, enable_color: bool) {
    if enable_color {
        println!("{}", "Key Performance Indicators:".cyan());
    } else {
        println!("Key Performance Indicators:");
    }

    for kpi in &report.kpis {
        let value = kpi.outcome.to_string();
        if enable_color {
            if kpi.outcome.is_measured() {
                println!("  {}: {}", kpi.name, value.bright_white());
            } else {
                println!("  {}: {}", kpi.name, value.bright_black());
            }
        } else {
            println!("  {}: {}", kpi.name, value);
        }
    }
    println!();
}

fn print_findings(report: &SessionReport, enable_color: bool) {
    if report.findings.is_empty() {
        return;
    }

    if enable_color {
        println!("{}", "Findings:".cyan());
    } else {
        println!("Findings:");
    }

    for finding in &report.findings {
        let stamp = finding
            .timestamp
            .as_ref()
            .map(|ts| format!("[{}] ", format_timestamp(ts)))
            .unwrap_or_default();
        let label = format!("({})", finding.kind);

        if enable_color {
            let label_colored = if finding.kind.is_fault() {
                format!("{}", label.red().bold())
            } else {
                format!("{}", label.yellow())
            };
            println!("  {}{} {}", stamp.bright_black(), label_colored, finding.detail);
        } else {
            println!("  {}{} {}", stamp, label, finding.detail);
        }
    }
    println!();
}

fn print_walkthrough(report: &SessionReport, enable_color: bool) {
    if report.narrative.is_empty() {
        return;
    }

    if enable_color {
        println!("{}", "Chronological Walkthrough:".cyan());
    } else {
        println!("Chronological Walkthrough:");
    }

    for entry in &report.narrative {
        let stamp = format!("[{}]", format_timestamp(&entry.timestamp));
        if enable_color {
            let text_colored = match entry.severity {
                Severity::Normal => entry.text.clone(),
                Severity::Warning => format!("{}", entry.text.yellow()),
                Severity::Critical => format!("{}", entry.text.red().bold()),
            };
            println!("  {} {}", stamp.bright_black(), text_colored);
        } else {
            println!("  {} {}", stamp, entry.text);
        }
    }
    println!();
}

fn print_entities(report: &SessionReport, enable_color: bool) {
    let entities = &report.summary.entities;
    if entities.is_empty() {
        return;
    }

    if enable_color {
        println!("{}", "Key Entities:".cyan());
    } else {
        println!("Key Entities:");
    }

    for (label, values) in [
        ("Operators", &entities.operators),
        ("Magazines", &entities.magazines),
        ("Lots", &entities.lots),
        ("Panels", &entities.panels),
    ] {
        if !values.is_empty() {
            println!("  {}: {}", label, values.join(", "));
        }
    }
    println!();
}

fn print_action_plan(report: &SessionReport, enable_color: bool) {
    if report.summary.action_plan.is_empty() {
        return;
    }

    if enable_color {
        println!("{}", "Action Plan:".cyan());
    } else {
        println!("Action Plan:");
    }

    for (position, action) in report.summary.action_plan.iter().enumerate() {
        println!("  {}. {}", position + 1, action);
    }
}
