use std::path::PathBuf;
use std::time::Duration;

/// Scan duration the scanner tool is launched with unless overridden.
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(60);

/// Scanner executable looked up on `PATH` unless overridden.
pub const DEFAULT_SCANNER_TOOL: &str = "dcpscan";

pub struct Config {
    /// External topology scanner launched for each capture.
    pub scanner_tool: PathBuf,
    /// How long the scanner listens on the adapter (`-t`).
    pub scan_duration: Duration,
    /// Output verbosity. 0 prints everything, higher values suppress headers and progress.
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanner_tool: PathBuf::from(DEFAULT_SCANNER_TOOL),
            scan_duration: DEFAULT_SCAN_DURATION,
            quiet: 0,
        }
    }
}
