use clap::ValueEnum;
use gemtrace_kb::Category;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Text,
    Json,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Text => write!(f, "text"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KbCategory {
    Event,
    Command,
    MessageType,
    PortState,
    IdReadResult,
    Alarm,
    StatusVariable,
}

impl KbCategory {
    /// Every category, in the order `kb list` prints them.
    pub const ALL: [KbCategory; 7] = [
        KbCategory::Event,
        KbCategory::Command,
        KbCategory::MessageType,
        KbCategory::PortState,
        KbCategory::IdReadResult,
        KbCategory::Alarm,
        KbCategory::StatusVariable,
    ];
}

impl fmt::Display for KbCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KbCategory::Event => "event",
            KbCategory::Command => "command",
            KbCategory::MessageType => "message-type",
            KbCategory::PortState => "port-state",
            KbCategory::IdReadResult => "id-read-result",
            KbCategory::Alarm => "alarm",
            KbCategory::StatusVariable => "status-variable",
        };
        write!(f, "{}", name)
    }
}

impl From<KbCategory> for Category {
    fn from(category: KbCategory) -> Self {
        match category {
            KbCategory::Event => Category::Event,
            KbCategory::Command => Category::Command,
            KbCategory::MessageType => Category::MessageType,
            KbCategory::PortState => Category::PortState,
            KbCategory::IdReadResult => Category::IdReadResult,
            KbCategory::Alarm => Category::Alarm,
            KbCategory::StatusVariable => Category::StatusVariable,
        }
    }
}
