pub mod adapters;
pub mod capture;
pub mod hil;

use std::path::PathBuf;

use busforge_common::config::DEFAULT_SCAN_DURATION;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "busforge")]
#[command(about = "Field-bus capture and HiL generation for automation projects.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Topology scanner executable
    #[arg(long, global = true, value_name = "PATH")]
    pub scanner: Option<PathBuf>,

    /// How long the scanner listens, in seconds
    #[arg(long, global = true, value_name = "SECS", default_value_t = DEFAULT_SCAN_DURATION.as_secs())]
    pub duration: u64,

    /// Less output: hide headers and progress, only show warnings and errors
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the adapters a capture can run on
    #[command(alias = "a")]
    Adapters,
    /// Scan a field bus and import what was found as an IO device
    #[command(alias = "c")]
    Capture {
        /// Name of the IO device in the project
        name: String,
        /// Adapter id, name or "name (description)"
        #[arg(short, long)]
        adapter: String,
        /// Project file
        #[arg(short, long)]
        project: PathBuf,
        /// Reference hardware file the scanned devices are normalized against
        #[arg(short, long)]
        reference: Option<PathBuf>,
    },
    /// Regenerate the HiL programs of a project
    #[command(alias = "h")]
    Hil {
        /// Project file
        #[arg(short, long)]
        project: PathBuf,
        /// Item the HiL folder is created under
        #[arg(long, default_value = "PLC")]
        plc: String,
        /// Config file HiL programs are registered in [default: busforge.xml next to the project]
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
