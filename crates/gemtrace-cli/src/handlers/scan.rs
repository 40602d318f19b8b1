use crate::context::ExecutionContext;
use crate::session_loader::load_report;
use anyhow::Result;
use gemtrace_engine::AnalysisOptions;
use std::path::Path;
use walkdir::WalkDir;

fn is_log_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("log") | Some("txt")
    )
}

/// Analyze every `.log`/`.txt` file under a directory, one verdict line
/// per file. A file that cannot be read or parsed is a warning, never an
/// abort for the rest of the tree.
pub fn handle(ctx: &ExecutionContext, dir: &Path) -> Result<()> {
    let options = AnalysisOptions::default();
    let mut scanned = 0usize;
    let mut faulted = 0usize;

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_log_file(path) {
            continue;
        }

        match load_report(ctx, path, &options) {
            Ok(report) => {
                scanned += 1;
                if report.is_fault() {
                    faulted += 1;
                }
                println!(
                    "{}: {} ({} records, {} findings)",
                    path.display(),
                    report.verdict,
                    report.records.len(),
                    report.findings.len()
                );
            }
            Err(e) => {
                eprintln!("Warning: skipping {}: {:#}", path.display(), e);
            }
        }
    }

    if scanned == 0 {
        println!("No log files found under {}", dir.display());
    } else {
        println!();
        println!(
            "Scanned {} file{}, {} in fault state",
            scanned,
            if scanned == 1 { "" } else { "s" },
            faulted
        );
    }

    Ok(())
}
