use gemtrace_types::{
    AnomalyFinding, KeyEntities, KpiResult, MessageRecord, Priority, SessionSummary, Verdict,
};

/// Derive the session verdict and executive summary.
///
/// The verdict hinges on raised alarms alone: any `AlarmRaised` finding
/// means `FaultState` and `High` priority, everything else (orphans,
/// failed reads, duplicates) is reported but does not change the verdict.
pub fn summarize(
    records: &[MessageRecord],
    kpis: &[KpiResult],
    findings: &[AnomalyFinding],
) -> (Verdict, Priority, SessionSummary) {
    let raised = findings.iter().filter(|f| f.kind.is_fault()).count();

    let (verdict, priority) = if raised > 0 {
        (Verdict::FaultState, Priority::High)
    } else {
        (Verdict::GoldenRun, Priority::Normal)
    };

    let headline = if raised > 0 {
        format!(
            "The equipment is in a fault state: {} alarm{} raised during the session.",
            raised,
            if raised == 1 { " was" } else { "s were" }
        )
    } else {
        "The process was successful and represents a 'Golden Run'. No alarms were raised."
            .to_string()
    };

    let mut action_plan = Vec::new();
    if raised > 0 {
        action_plan.push(
            "Document the raised alarms and log each occurrence for future reference.".to_string(),
        );
    }
    action_plan.push(
        "Track the KPIs from this report to establish performance baselines.".to_string(),
    );
    if !records.is_empty() {
        let unmeasured: Vec<&str> = kpis
            .iter()
            .filter(|kpi| !kpi.outcome.is_measured())
            .map(|kpi| kpi.name.as_str())
            .collect();
        if !unmeasured.is_empty() {
            action_plan.push(format!(
                "Capture a log spanning a complete load cycle; {} could not be measured.",
                unmeasured.join(", ")
            ));
        }
    }

    let summary = SessionSummary {
        headline,
        entities: collect_entities(records),
        action_plan,
        note: records
            .is_empty()
            .then(|| "no events were found".to_string()),
    };
    (verdict, priority, summary)
}

fn collect_entities(records: &[MessageRecord]) -> KeyEntities {
    let mut entities = KeyEntities::default();
    for record in records {
        if let Some(operator) = &record.fields.operator_id {
            entities.operators.push(operator.clone());
        }
        if let Some(magazine) = &record.fields.magazine_id {
            entities.magazines.push(magazine.clone());
        }
        if let Some(lot) = &record.fields.lot_id {
            entities.lots.push(lot.clone());
        }
        if let Some(panel) = &record.fields.panel_id {
            entities.panels.push(panel.clone());
        }
    }
    for list in [
        &mut entities.operators,
        &mut entities.magazines,
        &mut entities.lots,
        &mut entities.panels,
    ] {
        list.sort_unstable();
        list.dedup();
    }
    entities
}
