use crate::overlay::KbOverlay;
use crate::tables;
use gemtrace_types::{Error, FieldKey, Meaning, Result};
use std::collections::HashMap;

/// Which table a code should be resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Event,
    Command,
    MessageType,
    PortState,
    IdReadResult,
    Alarm,
    StatusVariable,
}

/// Read-only code-to-meaning tables for one analysis run.
///
/// Resolution never fails: a code without an entry comes back as
/// `Meaning::Unknown` carrying the original code. Each run constructs a
/// fresh instance, so overlay edits take effect on the next invocation
/// without any process-global state.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    events: HashMap<u32, String>,
    commands: HashMap<String, String>,
    message_types: HashMap<String, String>,
    port_states: HashMap<String, String>,
    id_read_results: HashMap<String, String>,
    alarms: HashMap<u32, String>,
    status_variables: HashMap<u32, String>,
}

impl KnowledgeBase {
    /// The built-in tables, with no site-local additions.
    pub fn builtin() -> Self {
        KnowledgeBase {
            events: tables::EVENTS
                .iter()
                .map(|(code, name)| (*code, (*name).to_string()))
                .collect(),
            commands: owned_map(tables::COMMANDS),
            message_types: owned_map(tables::MESSAGE_TYPES),
            port_states: owned_map(tables::PORT_STATES),
            id_read_results: owned_map(tables::ID_READ_RESULTS),
            alarms: tables::ALARMS
                .iter()
                .map(|(code, text)| (*code, (*text).to_string()))
                .collect(),
            status_variables: tables::STATUS_VARIABLES
                .iter()
                .map(|(code, name)| (*code, (*name).to_string()))
                .collect(),
        }
    }

    /// Built-in tables with overlay entries merged on top. Overlay entries
    /// win on key collision.
    pub fn with_overlay(overlay: &KbOverlay) -> Result<Self> {
        let mut kb = Self::builtin();
        kb.apply(overlay)?;
        Ok(kb)
    }

    fn apply(&mut self, overlay: &KbOverlay) -> Result<()> {
        merge_numeric(&mut self.events, &overlay.events, "events")?;
        merge_numeric(&mut self.alarms, &overlay.alarms, "alarms")?;
        merge_numeric(
            &mut self.status_variables,
            &overlay.status_variables,
            "status_variables",
        )?;

        for (key, value) in &overlay.commands {
            self.commands.insert(key.clone(), value.clone());
        }
        for (key, value) in &overlay.message_types {
            self.message_types.insert(key.clone(), value.clone());
        }
        for (key, value) in &overlay.port_states {
            self.port_states.insert(key.clone(), value.clone());
        }
        for (key, value) in &overlay.id_read_results {
            self.id_read_results.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    /// Resolve a code in any category. String categories match the code
    /// verbatim; numeric categories parse it first, and an unparsable code
    /// resolves to `Unknown` like any other miss.
    pub fn resolve(&self, category: Category, code: &str) -> Meaning {
        let hit = match category {
            Category::Event => code.parse().ok().and_then(|c: u32| self.events.get(&c)),
            Category::Alarm => code.parse().ok().and_then(|c: u32| self.alarms.get(&c)),
            Category::StatusVariable => code
                .parse()
                .ok()
                .and_then(|c: u32| self.status_variables.get(&c)),
            Category::Command => self.commands.get(code),
            Category::MessageType => self.message_types.get(code),
            Category::PortState => self.port_states.get(code),
            Category::IdReadResult => self.id_read_results.get(code),
        };
        match hit {
            Some(meaning) => Meaning::Known(meaning.clone()),
            None => Meaning::Unknown(code.to_string()),
        }
    }

    pub fn event_name(&self, ceid: u32) -> Meaning {
        match self.events.get(&ceid) {
            Some(name) => Meaning::Known(name.clone()),
            None => Meaning::Unknown(ceid.to_string()),
        }
    }

    /// Whether a numeric value is a known collection event ID. Used to pick
    /// the CEID out of an event report's unlabeled integer fields.
    pub fn is_event(&self, ceid: u32) -> bool {
        self.events.contains_key(&ceid)
    }

    pub fn command_description(&self, rcmd: &str) -> Meaning {
        self.resolve(Category::Command, rcmd)
    }

    /// Whether an uppercase token is a known remote command name.
    pub fn is_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn message_name(&self, message_type: &str) -> Meaning {
        self.resolve(Category::MessageType, message_type)
    }

    pub fn port_state(&self, code: &str) -> Meaning {
        self.resolve(Category::PortState, code)
    }

    pub fn id_read_result(&self, code: &str) -> Meaning {
        self.resolve(Category::IdReadResult, code)
    }

    pub fn alarm_text(&self, alid: u32) -> Meaning {
        match self.alarms.get(&alid) {
            Some(text) => Meaning::Known(text.clone()),
            None => Meaning::Unknown(alid.to_string()),
        }
    }

    pub fn status_variable(&self, svid: u32) -> Meaning {
        match self.status_variables.get(&svid) {
            Some(name) => Meaning::Known(name.clone()),
            None => Meaning::Unknown(svid.to_string()),
        }
    }

    /// Every `(code, meaning)` pair in one category, sorted for display.
    /// Numeric categories sort by code value, message types by stream and
    /// function, the rest lexically. Drives the `kb` listing command.
    pub fn entries(&self, category: Category) -> Vec<(String, String)> {
        match category {
            Category::Event => sorted_numeric(&self.events),
            Category::Alarm => sorted_numeric(&self.alarms),
            Category::StatusVariable => sorted_numeric(&self.status_variables),
            Category::Command => sorted_lexical(&self.commands),
            Category::PortState => sorted_lexical(&self.port_states),
            Category::IdReadResult => sorted_lexical(&self.id_read_results),
            Category::MessageType => {
                let mut entries: Vec<(String, String)> = self
                    .message_types
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                entries.sort_by_key(|(key, _)| stream_function(key));
                entries
            }
        }
    }
}

fn sorted_numeric(table: &HashMap<u32, String>) -> Vec<(String, String)> {
    let mut codes: Vec<u32> = table.keys().copied().collect();
    codes.sort_unstable();
    codes
        .into_iter()
        .map(|code| (code.to_string(), table[&code].clone()))
        .collect()
}

fn sorted_lexical(table: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = table
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

fn owned_map(table: &[(&str, &str)]) -> HashMap<String, String> {
    table
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

fn merge_numeric(
    target: &mut HashMap<u32, String>,
    source: &HashMap<String, String>,
    section: &str,
) -> Result<()> {
    for (key, value) in source {
        let code: u32 = key.parse().map_err(|_| {
            Error::Overlay(format!("[{}] key '{}' is not a numeric code", section, key))
        })?;
        target.insert(code, value.clone());
    }
    Ok(())
}

fn stream_function(message_type: &str) -> (u32, u32) {
    let rest = message_type.strip_prefix('S').unwrap_or(message_type);
    match rest.split_once('F') {
        Some((stream, function)) => (
            stream.parse().unwrap_or(u32::MAX),
            function.parse().unwrap_or(u32::MAX),
        ),
        None => (u32::MAX, u32::MAX),
    }
}

/// Identifier fields an event of the given name is expected to carry.
///
/// Consumed by anomaly detection: an event missing one of these fields is
/// flagged, since downstream traceability depends on them.
pub fn expected_identifiers(event_name: &str) -> &'static [FieldKey] {
    match event_name {
        "PortStatusChange" => &[FieldKey::PortId, FieldKey::PortState],
        "IDRead" => &[FieldKey::LotId, FieldKey::PanelId],
        "MagazineDocked" => &[FieldKey::PortId, FieldKey::MagazineId, FieldKey::OperatorId],
        "AlarmSet" | "AlarmClear" => &[FieldKey::AlarmId],
        _ => &[],
    }
}
