use crate::context::ExecutionContext;
use crate::output::print_report;
use crate::session_loader::load_report;
use anyhow::Result;
use chrono::TimeDelta;
use gemtrace_engine::{AnalysisOptions, MatcherConfig};
use std::path::Path;

pub fn handle(ctx: &ExecutionContext, file: &Path, window_secs: u32) -> Result<()> {
    let options = AnalysisOptions {
        matcher: MatcherConfig {
            reply_window: TimeDelta::seconds(i64::from(window_secs)),
        },
        ..Default::default()
    };

    let report = load_report(ctx, file, &options)?;
    print_report(&report, ctx.enable_color());

    Ok(())
}
