use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// NOTE: Schema Design Goals
//
// 1. Zero data loss: every byte of a message body lands either in a typed
//    field or in `remainder`. The remainder field is required (never
//    Option) so tests can assert the guarantee structurally.
//
// 2. Graceful degradation: codes without a knowledge-base entry resolve to
//    an explicit Unknown sentinel. Downstream stages treat unknown exactly
//    like known-but-opaque, never as an error.
//
// 3. Traceability: `block_index` links every derived artifact (narrative
//    line, transaction, finding) back to the raw block it came from.

/// Direction of a message on the host/equipment link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HostToEquipment,
    EquipmentToHost,
}

impl Direction {
    /// The direction a reply to this message travels in.
    pub fn complement(self) -> Direction {
        match self {
            Direction::HostToEquipment => Direction::EquipmentToHost,
            Direction::EquipmentToHost => Direction::HostToEquipment,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::HostToEquipment => write!(f, "Host->Equipment"),
            Direction::EquipmentToHost => write!(f, "Equipment->Host"),
        }
    }
}

/// One delimited unit of the source log: a timestamped header line plus the
/// SECS-II body dump that follows it.
///
/// Created once per parsed block by the segmentation stage and owned by the
/// extraction stage only during its own processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessageBlock {
    /// Position of the block within the source file (0-based).
    pub index: usize,

    /// Header timestamp, microsecond precision, no timezone.
    pub timestamp: NaiveDateTime,

    pub direction: Direction,

    /// Stream/function pair, e.g. `S6F11`.
    pub message_type: String,

    /// Transaction identifier from the header (`SystemBytes=`), when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_bytes: Option<u32>,

    /// Raw body text, verbatim.
    pub body: String,
}

/// Resolution result of a knowledge-base lookup.
///
/// Unknown codes are data, not errors: they degrade to `Unknown(code)` and
/// stay visible all the way into the final report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Meaning {
    Known(String),
    Unknown(String),
}

impl Meaning {
    pub fn is_known(&self) -> bool {
        matches!(self, Meaning::Known(_))
    }

    /// The resolved name, only when the code was actually in the table.
    pub fn known(&self) -> Option<&str> {
        match self {
            Meaning::Known(name) => Some(name),
            Meaning::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Meaning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meaning::Known(name) => write!(f, "{}", name),
            Meaning::Unknown(code) => write!(f, "Unknown({})", code),
        }
    }
}

/// An event-class code (CEID) together with its resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub code: u32,
    pub name: Meaning,
}

impl ResolvedEvent {
    pub fn is(&self, name: &str) -> bool {
        self.name.known() == Some(name)
    }
}

/// Outcome of a panel identifier read reported by the equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdReadResult {
    /// Raw result code, `"0"` on success.
    pub code: String,
    pub meaning: Meaning,
}

impl IdReadResult {
    pub fn is_failure(&self) -> bool {
        self.code != "0"
    }
}

/// A status-variable value embedded in an event report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvidReading {
    pub svid: u32,
    pub name: Meaning,
    pub value: String,
}

/// Keys for the optional typed fields of a [`MessageFields`] set.
///
/// Used by the anomaly detector to state which identifier a message-type
/// rule expected but did not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    BodyClock,
    PortId,
    PortState,
    MagazineId,
    OperatorId,
    LotId,
    PanelId,
    SlotInfo,
    SourcePortId,
    DestinationPortId,
    Orientation,
    AlarmId,
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKey::BodyClock => "BodyClock",
            FieldKey::PortId => "PortID",
            FieldKey::PortState => "PortState",
            FieldKey::MagazineId => "MagazineID",
            FieldKey::OperatorId => "OperatorID",
            FieldKey::LotId => "LotID",
            FieldKey::PanelId => "PanelID",
            FieldKey::SlotInfo => "SlotInfo",
            FieldKey::SourcePortId => "SrcPortID",
            FieldKey::DestinationPortId => "DestPortID",
            FieldKey::Orientation => "Orientation",
            FieldKey::AlarmId => "AlarmID",
        };
        write!(f, "{}", name)
    }
}

/// The optional typed fields an extraction rule may populate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageFields {
    /// Equipment clock carried inside the body (CLOCK variable or S2F32).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_clock: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_id: Option<u32>,

    /// Port state code (MIR, MIC, MPC, MOR, OOS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magazine_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_info: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port_id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_port_id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_id: Option<u32>,

    /// Alarm transition: `true` raised, `false` cleared. From the event
    /// name in S6F11 reports or the ALCD bit in S5F1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_set: Option<bool>,

    /// Alarm description resolved from the ALID table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_text: Option<Meaning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_read: Option<IdReadResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_variable: Option<SvidReading>,
}

impl MessageFields {
    /// Whether the field behind `key` was populated.
    pub fn has(&self, key: FieldKey) -> bool {
        match key {
            FieldKey::BodyClock => self.body_clock.is_some(),
            FieldKey::PortId => self.port_id.is_some(),
            FieldKey::PortState => self.port_state.is_some(),
            FieldKey::MagazineId => self.magazine_id.is_some(),
            FieldKey::OperatorId => self.operator_id.is_some(),
            FieldKey::LotId => self.lot_id.is_some(),
            FieldKey::PanelId => self.panel_id.is_some(),
            FieldKey::SlotInfo => self.slot_info.is_some(),
            FieldKey::SourcePortId => self.source_port_id.is_some(),
            FieldKey::DestinationPortId => self.destination_port_id.is_some(),
            FieldKey::Orientation => self.orientation.is_some(),
            FieldKey::AlarmId => self.alarm_id.is_some(),
        }
    }

    /// True when no typed field at all was recognized.
    pub fn is_empty(&self) -> bool {
        *self == MessageFields::default()
    }
}

/// Structured result of extracting one [`RawMessageBlock`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Index of the originating block in the source file.
    pub block_index: usize,

    pub timestamp: NaiveDateTime,

    pub direction: Direction,

    /// Stream/function pair, e.g. `S6F11`.
    pub message_type: String,

    /// Resolved meaning of the stream/function pair.
    pub message_name: Meaning,

    /// Transaction identifier, when the message carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<u32>,

    /// Event-class code and name, for event-report messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<ResolvedEvent>,

    /// Remote command name (RCMD), for host-command messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    pub fields: MessageFields,

    /// Body text not consumed by any specific-field rule. Required so the
    /// no-data-loss guarantee is structural rather than by convention.
    pub remainder: String,
}

impl MessageRecord {
    /// Resolved event name, only when known.
    pub fn event_name(&self) -> Option<&str> {
        self.event.as_ref().and_then(|e| e.name.known())
    }

    pub fn is_event(&self, name: &str) -> bool {
        self.event_name() == Some(name)
    }

    pub fn is_command(&self, name: &str) -> bool {
        self.command.as_deref() == Some(name)
    }

    /// Best available semantic label for display: the event name, the
    /// command, or the unknown-type sentinel, in that order.
    pub fn semantic_label(&self) -> Option<String> {
        if let Some(event) = &self.event {
            return Some(event.name.to_string());
        }
        if let Some(command) = &self.command {
            return Some(command.clone());
        }
        match &self.message_name {
            Meaning::Unknown(_) => Some(self.message_name.to_string()),
            Meaning::Known(_) => None,
        }
    }
}
