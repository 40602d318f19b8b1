use gemtrace_kb::KnowledgeBase;
use gemtrace_types::{MessageRecord, NarrativeEntry, Severity};
use serde::{Deserialize, Serialize};

/// How one step of an [`ExpectedSequence`] is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTrigger {
    /// Matches records whose resolved event name equals this.
    Event(String),
    /// Matches records carrying this validated remote command.
    Command(String),
}

impl StepTrigger {
    fn matches(&self, record: &MessageRecord) -> bool {
        match self {
            StepTrigger::Event(name) => record.is_event(name),
            StepTrigger::Command(name) => record.is_command(name),
        }
    }
}

/// One step of an expected operation sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub label: String,
    pub trigger: StepTrigger,
}

impl SequenceStep {
    pub fn event(name: &str) -> Self {
        SequenceStep {
            label: name.to_string(),
            trigger: StepTrigger::Event(name.to_string()),
        }
    }

    pub fn command(name: &str) -> Self {
        SequenceStep {
            label: name.to_string(),
            trigger: StepTrigger::Command(name.to_string()),
        }
    }
}

/// The operation model narration checks records against.
///
/// Plain data: swapping in a different sequence changes what counts as a
/// deviation without touching the narration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedSequence {
    pub name: String,
    pub steps: Vec<SequenceStep>,
}

impl ExpectedSequence {
    /// The ordinary magazine-to-tool load flow.
    pub fn standard_load_cycle() -> Self {
        ExpectedSequence {
            name: "standard load cycle".to_string(),
            steps: vec![
                SequenceStep::event("MagazineDocked"),
                SequenceStep::event("MappingCompleted"),
                SequenceStep::command("LOADSTART"),
                SequenceStep::event("LoadToToolCompleted"),
            ],
        }
    }
}

impl Default for ExpectedSequence {
    fn default() -> Self {
        Self::standard_load_cycle()
    }
}

type DescriberFn = fn(&MessageRecord, &KnowledgeBase) -> (String, Severity);

/// Describers for events with a dedicated phrasing; everything else gets
/// the generic event line or the unknown fallback.
const EVENT_DESCRIBERS: &[(&str, DescriberFn)] = &[
    ("PortStatusChange", describe_port_status),
    ("IDRead", describe_id_read),
    ("MagazineDocked", describe_magazine_docked),
    ("AlarmSet", describe_alarm),
    ("AlarmClear", describe_alarm),
    ("GemPPChangeEvent", describe_svid),
];

/// Turns a record sequence into a chronological plain-language account,
/// flagging departures from the expected operation sequence.
pub struct EventNarrator {
    sequence: ExpectedSequence,
}

impl EventNarrator {
    pub fn new(sequence: ExpectedSequence) -> Self {
        EventNarrator { sequence }
    }

    /// One entry per record, in input order. The sequence cursor lives on
    /// the stack, so repeated runs over the same records are identical.
    pub fn narrate(&self, records: &[MessageRecord], kb: &KnowledgeBase) -> Vec<NarrativeEntry> {
        let mut entries = Vec::with_capacity(records.len());
        let mut cursor = 0usize;

        for record in records {
            let (base, base_severity) = describe(record, kb);
            let (next_cursor, deviation) = self.advance(record, cursor);
            cursor = next_cursor;

            let (text, severity) = match deviation {
                Some(note) => (
                    format!("{} (deviation: {})", base, note),
                    base_severity.max(Severity::Warning),
                ),
                None => (base, base_severity),
            };

            entries.push(NarrativeEntry {
                timestamp: record.timestamp,
                severity,
                text,
                block_index: record.block_index,
            });
        }

        entries
    }

    /// Move the sequence cursor for one record and report any deviation.
    ///
    /// A match of the expected step advances silently. A later step warns
    /// and resyncs past it (one skipped step must not cascade). An earlier
    /// step warns without moving, except step 0, which silently restarts
    /// the cycle for multi-cycle logs. Records matching no step leave the
    /// cursor alone.
    fn advance(&self, record: &MessageRecord, cursor: usize) -> (usize, Option<String>) {
        let Some(step) = self
            .sequence
            .steps
            .iter()
            .position(|s| s.trigger.matches(record))
        else {
            return (cursor, None);
        };

        if step == cursor {
            return (cursor + 1, None);
        }
        if step == 0 {
            return (1, None);
        }
        if step > cursor {
            let expected = &self.sequence.steps[cursor].label;
            return (step + 1, Some(format!("expected {} first", expected)));
        }
        (
            cursor,
            Some(format!(
                "{} repeated out of order",
                self.sequence.steps[step].label
            )),
        )
    }
}

fn describe(record: &MessageRecord, kb: &KnowledgeBase) -> (String, Severity) {
    if record.command.is_some() {
        return describe_command(record, kb);
    }
    if let Some(event) = &record.event {
        if let Some(name) = event.name.known()
            && let Some((_, describer)) = EVENT_DESCRIBERS.iter().find(|(key, _)| *key == name)
        {
            return describer(record, kb);
        }
        return (format!("Event: {} occurred.", event.name), Severity::Normal);
    }
    if record.fields.alarm_set.is_some() {
        // S5F1 alarm reports carry no event code.
        return describe_alarm(record, kb);
    }
    ("Unknown log entry.".to_string(), Severity::Normal)
}

fn describe_port_status(record: &MessageRecord, kb: &KnowledgeBase) -> (String, Severity) {
    let port = number_or_na(record.fields.port_id);
    let code = record.fields.port_state.as_deref().unwrap_or("N/A");
    (
        format!(
            "Port {} status changed to {} ({}).",
            port,
            code,
            kb.port_state(code)
        ),
        Severity::Normal,
    )
}

fn describe_id_read(record: &MessageRecord, _kb: &KnowledgeBase) -> (String, Severity) {
    let panel = record.fields.panel_id.as_deref().unwrap_or("N/A");
    let lot = record.fields.lot_id.as_deref().unwrap_or("N/A");
    let slot = record.fields.slot_info.as_deref().unwrap_or("N/A");
    let (result, severity) = match &record.fields.id_read {
        Some(read) if read.is_failure() => (read.meaning.to_string(), Severity::Critical),
        Some(read) => (read.meaning.to_string(), Severity::Normal),
        None => ("N/A".to_string(), Severity::Normal),
    };
    (
        format!(
            "Read Panel ID '{}' from Lot '{}' in {}. Result: {}.",
            panel, lot, slot, result
        ),
        severity,
    )
}

fn describe_magazine_docked(record: &MessageRecord, _kb: &KnowledgeBase) -> (String, Severity) {
    (
        format!(
            "Magazine '{}' docked at Port {} by Operator '{}'.",
            record.fields.magazine_id.as_deref().unwrap_or("N/A"),
            number_or_na(record.fields.port_id),
            record.fields.operator_id.as_deref().unwrap_or("N/A"),
        ),
        Severity::Normal,
    )
}

fn describe_alarm(record: &MessageRecord, kb: &KnowledgeBase) -> (String, Severity) {
    let set = record.fields.alarm_set.unwrap_or(true);
    let text = match (&record.fields.alarm_text, record.fields.alarm_id) {
        (Some(meaning), _) => meaning.to_string(),
        (None, Some(alid)) => kb.alarm_text(alid).to_string(),
        (None, None) => "Unknown Alarm".to_string(),
    };
    let state = if set { "AlarmSet" } else { "AlarmClear" };
    let severity = if set {
        Severity::Critical
    } else {
        Severity::Warning
    };
    (
        format!(
            "Alarm '{}' ({}) changed to: {}.",
            number_or_na(record.fields.alarm_id),
            text,
            state
        ),
        severity,
    )
}

fn describe_svid(record: &MessageRecord, _kb: &KnowledgeBase) -> (String, Severity) {
    let line = match &record.fields.status_variable {
        Some(reading) => format!("Status Update: {} is now '{}'.", reading.name, reading.value),
        None => "Status Update: Unknown SVID is now 'N/A'.".to_string(),
    };
    (line, Severity::Normal)
}

fn describe_command(record: &MessageRecord, kb: &KnowledgeBase) -> (String, Severity) {
    let Some(rcmd) = record.command.as_deref() else {
        return ("Unknown log entry.".to_string(), Severity::Normal);
    };
    let port = record.fields.source_port_id.or(record.fields.port_id);
    let line = match (record.fields.lot_id.as_deref(), port) {
        (Some(lot), Some(port)) => format!(
            "Host Command: Sent `{}` for Lot '{}' on Port {}.",
            rcmd, lot, port
        ),
        _ => format!(
            "Host Command: Sent `{}`. ({})",
            rcmd,
            kb.command_description(rcmd)
        ),
    };
    (line, Severity::Normal)
}

fn number_or_na(value: Option<u32>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
