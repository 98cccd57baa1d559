//! Launching the external topology scanner.
//!
//! The scanner listens on one adapter for a fixed time and writes what it saw
//! as a device descriptor. Its exit status is logged but never acted on: only
//! the descriptor it leaves behind matters.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, error, info};

/// Arguments of one scanner run.
#[derive(Debug, Clone, Copy)]
pub struct ScanJob<'a> {
    pub adapter_id: &'a str,
    pub duration: Duration,
    pub output: &'a Path,
}

pub trait ScannerTool: Send + Sync {
    fn name(&self) -> String;

    /// Runs one scan to completion and returns the exit code, if any.
    fn run(&self, job: &ScanJob<'_>) -> io::Result<Option<i32>>;
}

/// A scanner executable invoked as `-d <adapter> -t <seconds> -o <file>`.
#[derive(Debug, Clone)]
pub struct ExternalScanner {
    program: PathBuf,
}

impl ExternalScanner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn arguments(job: &ScanJob<'_>) -> Vec<OsString> {
        vec![
            "-d".into(),
            job.adapter_id.into(),
            "-t".into(),
            job.duration.as_secs().to_string().into(),
            "-o".into(),
            job.output.as_os_str().to_owned(),
        ]
    }
}

impl ScannerTool for ExternalScanner {
    fn name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn run(&self, job: &ScanJob<'_>) -> io::Result<Option<i32>> {
        let status = Command::new(&self.program)
            .args(Self::arguments(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        Ok(status.code())
    }
}

/// Runs `tool` and blocks until it exits.
///
/// Returns `false` when the tool could not be launched; the failure is logged.
pub fn run_scanner(tool: &dyn ScannerTool, job: &ScanJob<'_>) -> bool {
    let name = tool.name();
    info!(
        "Running {name}. This will take about {} seconds...",
        job.duration.as_secs()
    );

    match tool.run(job) {
        Ok(code) => {
            if code != Some(0) {
                debug!("{name} exited with {code:?}");
            }
            info!("{name} has finished");
            true
        }
        Err(e) => {
            error!("Failed to launch {name}: {e}");
            false
        }
    }
}
