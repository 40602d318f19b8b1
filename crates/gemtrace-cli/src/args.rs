use crate::types::{ExportFormat, KbCategory};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gemtrace")]
#[command(about = "Analyze SECS/GEM equipment communication logs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        value_name = "FILE",
        global = true,
        help = "Knowledge-base overlay (TOML) merged over the built-in tables"
    )]
    pub kb: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Analyze {
        file: PathBuf,

        #[arg(
            long,
            default_value = "45",
            help = "Reply window for transaction pairing, in seconds"
        )]
        window_secs: u32,
    },

    Export {
        file: PathBuf,

        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "PATH", help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },

    Scan {
        dir: PathBuf,
    },

    Kb {
        #[command(subcommand)]
        command: KbCommand,
    },
}

#[derive(Subcommand)]
pub enum KbCommand {
    List {
        #[arg(long)]
        category: Option<KbCategory>,
    },

    Resolve { category: KbCategory, code: String },
}
