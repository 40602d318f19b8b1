// NOTE: gemtrace CLI layering
//
// args/types parse the invocation, commands dispatches it, handlers do
// the work, output renders. Handlers never build a KnowledgeBase
// themselves: they go through ExecutionContext, so the overlay is loaded
// once and every command sees the same tables.
//
// Analysis itself lives in gemtrace-engine; this crate only loads files,
// wires options, and presents the resulting SessionReport.

mod args;
mod commands;
pub mod context;
mod handlers;
mod output;
mod session_loader;
pub mod types;

pub use args::{Cli, Commands, KbCommand};
pub use commands::run;
