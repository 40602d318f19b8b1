use gemtrace_types::{EventRef, KpiOutcome, KpiResult, MessageRecord};

/// Predicate selecting the records that anchor a KPI endpoint.
///
/// Predicates look at resolved meaning (event names, commands, typed
/// fields), never at positions, so reordered or noisy logs measure the
/// same intervals.
pub type EventPredicate = fn(&MessageRecord) -> bool;

/// A named interval metric: the first record satisfying `start` to the
/// first subsequent record satisfying `end`.
#[derive(Debug, Clone)]
pub struct KpiDefinition {
    pub name: &'static str,
    pub start: EventPredicate,
    pub end: EventPredicate,
}

/// Computes the configured interval metrics plus the derived per-panel
/// average over a record sequence.
pub struct KpiCalculator {
    definitions: Vec<KpiDefinition>,
}

impl KpiCalculator {
    /// The stock loadport timing metrics.
    pub fn standard() -> Self {
        KpiCalculator {
            definitions: vec![
                KpiDefinition {
                    name: "TotalCycleTime",
                    start: |record| record.is_command("LOADSTART"),
                    end: |record| record.is_event("LoadToToolCompleted"),
                },
                KpiDefinition {
                    name: "MappingTime",
                    start: |record| record.fields.port_state.as_deref() == Some("MIC"),
                    end: |record| record.is_event("MappingCompleted"),
                },
            ],
        }
    }

    pub fn with_definitions(definitions: Vec<KpiDefinition>) -> Self {
        KpiCalculator { definitions }
    }

    /// Compute every configured KPI, then append `AverageTimePerPanel`
    /// derived from `TotalCycleTime` and the distinct panel ids observed.
    ///
    /// Pure function of the input: identical records yield identical
    /// results.
    pub fn compute(&self, records: &[MessageRecord]) -> Vec<KpiResult> {
        let mut results: Vec<KpiResult> = self
            .definitions
            .iter()
            .map(|definition| compute_interval(definition, records))
            .collect();
        results.push(average_time_per_panel(&results, records));
        results
    }
}

fn compute_interval(definition: &KpiDefinition, records: &[MessageRecord]) -> KpiResult {
    let Some(start_pos) = records.iter().position(|r| (definition.start)(r)) else {
        return KpiResult {
            name: definition.name.to_string(),
            start: None,
            end: None,
            outcome: KpiOutcome::unavailable("start event never observed"),
        };
    };
    let start_ref = EventRef {
        block_index: records[start_pos].block_index,
        timestamp: records[start_pos].timestamp,
    };

    let end_pos = records[start_pos + 1..]
        .iter()
        .position(|r| (definition.end)(r))
        .map(|offset| start_pos + 1 + offset);
    let Some(end_pos) = end_pos else {
        return KpiResult {
            name: definition.name.to_string(),
            start: Some(start_ref),
            end: None,
            outcome: KpiOutcome::unavailable("end event never observed after start"),
        };
    };
    let end_ref = EventRef {
        block_index: records[end_pos].block_index,
        timestamp: records[end_pos].timestamp,
    };

    let outcome = match (end_ref.timestamp - start_ref.timestamp).num_microseconds() {
        Some(duration_us) => KpiOutcome::Measured { duration_us },
        None => KpiOutcome::unavailable("interval exceeds representable range"),
    };
    KpiResult {
        name: definition.name.to_string(),
        start: Some(start_ref),
        end: Some(end_ref),
        outcome,
    }
}

/// `TotalCycleTime` divided by the number of distinct panel ids seen on
/// records carrying one. Explicitly unavailable on a missing dividend or
/// an empty divisor; never zero and never an error.
fn average_time_per_panel(results: &[KpiResult], records: &[MessageRecord]) -> KpiResult {
    let cycle_us = results
        .iter()
        .find(|result| result.name == "TotalCycleTime")
        .and_then(|result| result.outcome.duration_us());

    let mut panels: Vec<&str> = records
        .iter()
        .filter_map(|record| record.fields.panel_id.as_deref())
        .collect();
    panels.sort_unstable();
    panels.dedup();

    let outcome = match cycle_us {
        None => KpiOutcome::unavailable("TotalCycleTime not determinable"),
        Some(_) if panels.is_empty() => KpiOutcome::unavailable("no panel identifiers observed"),
        Some(total) => KpiOutcome::Measured {
            duration_us: total / panels.len() as i64,
        },
    };
    KpiResult {
        name: "AverageTimePerPanel".to_string(),
        start: None,
        end: None,
        outcome,
    }
}
