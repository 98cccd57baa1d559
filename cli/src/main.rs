mod commands;
mod terminal;

use std::time::Duration;

use busforge_common::config::{Config, DEFAULT_SCANNER_TOOL};
use commands::{CommandLine, Commands, adapters, capture, hil};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);

    let cfg = Config {
        scanner_tool: commands
            .scanner
            .clone()
            .unwrap_or_else(|| DEFAULT_SCANNER_TOOL.into()),
        scan_duration: Duration::from_secs(commands.duration),
        quiet: commands.quiet,
    };

    print::banner(cfg.quiet);

    let result = match commands.command {
        Commands::Adapters => {
            print::header("capture adapters", cfg.quiet);
            adapters::adapters()
        }
        Commands::Capture {
            name,
            adapter,
            project,
            reference,
        } => {
            print::header("starting capture", cfg.quiet);
            capture::capture(name, &adapter, &project, reference, &cfg).await
        }
        Commands::Hil {
            project,
            plc,
            config,
        } => {
            print::header("regenerating hil", cfg.quiet);
            hil::hil(&project, &plc, config)
        }
    };

    print::end_of_program(cfg.quiet);
    result
}
