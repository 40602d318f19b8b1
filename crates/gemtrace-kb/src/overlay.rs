use gemtrace_types::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Site-local additions to the built-in tables, loaded from a TOML file.
///
/// Every section is optional and maps `code = "meaning"`. Numeric codes
/// (events, alarms, status variables) are written as quoted or bare keys;
/// they are validated when the overlay is merged.
///
/// ```toml
/// [events]
/// 205 = "CustomShuttleHomed"
///
/// [alarms]
/// 3001 = "Door Interlock Open"
///
/// [port_states]
/// MNT = "Maintenance Mode"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KbOverlay {
    #[serde(default)]
    pub events: HashMap<String, String>,
    #[serde(default)]
    pub commands: HashMap<String, String>,
    #[serde(default)]
    pub message_types: HashMap<String, String>,
    #[serde(default)]
    pub port_states: HashMap<String, String>,
    #[serde(default)]
    pub id_read_results: HashMap<String, String>,
    #[serde(default)]
    pub alarms: HashMap<String, String>,
    #[serde(default)]
    pub status_variables: HashMap<String, String>,
}

impl KbOverlay {
    /// Load an overlay from a TOML file. The path is user-supplied, so a
    /// missing file is an error rather than an implicit empty overlay.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| Error::Overlay(err.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.commands.is_empty()
            && self.message_types.is_empty()
            && self.port_states.is_empty()
            && self.id_read_results.is_empty()
            && self.alarms.is_empty()
            && self.status_variables.is_empty()
    }

    /// Total number of overlay entries across all sections.
    pub fn len(&self) -> usize {
        self.events.len()
            + self.commands.len()
            + self.message_types.len()
            + self.port_states.len()
            + self.id_read_results.len()
            + self.alarms.len()
            + self.status_variables.len()
    }
}
