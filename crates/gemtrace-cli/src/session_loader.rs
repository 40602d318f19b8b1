use crate::context::ExecutionContext;
use anyhow::{Context, Result};
use gemtrace_engine::{AnalysisOptions, build_report};
use gemtrace_parser::parse_log;
use gemtrace_types::{SessionReport, content_fingerprint};
use std::fs;
use std::path::Path;

/// Shared loading path for every command that analyzes a log file.
///
/// Reads the file, parses it against the active knowledge base, and runs the
/// full analysis pipeline. The only hard failure besides I/O is a file with
/// no recognizable message blocks.
pub fn load_report(
    ctx: &ExecutionContext,
    path: &Path,
    options: &AnalysisOptions,
) -> Result<SessionReport> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let kb = ctx.kb()?;
    let records =
        parse_log(&raw, kb).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(build_report(content_fingerprint(&raw), records, kb, options))
}
