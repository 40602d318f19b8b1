// Protocol knowledge base
// Built-in code tables plus an optional site-local TOML overlay

mod base;
mod overlay;
mod tables;

// Public API
pub use base::{Category, KnowledgeBase, expected_identifiers};
pub use overlay::KbOverlay;
