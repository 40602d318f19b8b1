use super::args::{Cli, Commands, KbCommand};
use super::handlers;
use crate::context::ExecutionContext;
use anyhow::Result;

pub fn run(cli: Cli) -> Result<()> {
    let ctx = ExecutionContext::new(cli.kb, cli.no_color);

    match cli.command {
        Commands::Analyze { file, window_secs } => {
            handlers::analyze::handle(&ctx, &file, window_secs)
        }

        Commands::Export {
            file,
            format,
            output,
        } => handlers::export::handle(&ctx, &file, format, output),

        Commands::Scan { dir } => handlers::scan::handle(&ctx, &dir),

        Commands::Kb { command } => match command {
            KbCommand::List { category } => handlers::kb::list(&ctx, category),
            KbCommand::Resolve { category, code } => handlers::kb::resolve(&ctx, category, &code),
        },
    }
}
