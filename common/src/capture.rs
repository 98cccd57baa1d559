use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::network::adapter::NetworkAdapter;

/// Extension of the descriptor file the scanner tool writes.
pub const DESCRIPTOR_EXTENSION: &str = "xti";

/// Why a capture request was turned down before anything ran.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum Rejection {
    #[error("a capture is already in progress")]
    Busy,
    #[error("empty device name")]
    EmptyDeviceName,
    #[error("device name cannot be used as a file name")]
    InvalidDeviceName,
    #[error("no adapter selected")]
    NoAdapter,
}

/// What the user asked a capture to do. Not yet validated.
#[derive(Debug, Clone, Default)]
pub struct ScanSettings {
    pub device_name: String,
    pub adapter: Option<NetworkAdapter>,
    /// Reference hardware description the descriptor is normalized against.
    pub reference: Option<PathBuf>,
}

impl ScanSettings {
    pub fn new(device_name: impl Into<String>, adapter: Option<NetworkAdapter>) -> Self {
        Self {
            device_name: device_name.into(),
            adapter,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<PathBuf>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Checks the settings in the order a capture would trip over them.
    pub fn validate(self) -> Result<CaptureRequest, Rejection> {
        let device_name = self.device_name.trim();
        if device_name.is_empty() {
            return Err(Rejection::EmptyDeviceName);
        }
        // the name becomes the artifact's file stem inside the project folder
        if device_name.contains(['/', '\\']) || device_name.chars().all(|c| c == '.') {
            return Err(Rejection::InvalidDeviceName);
        }
        let adapter = self.adapter.ok_or(Rejection::NoAdapter)?;
        let reference = self.reference.filter(|path| !path.as_os_str().is_empty());

        Ok(CaptureRequest {
            device_name: device_name.to_string(),
            adapter,
            reference,
        })
    }
}

/// Validated, immutable settings of one capture cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub device_name: String,
    pub adapter: NetworkAdapter,
    pub reference: Option<PathBuf>,
}

impl CaptureRequest {
    /// Where the scanner writes the descriptor for this device.
    pub fn artifact_path(&self, project_folder: &Path) -> PathBuf {
        project_folder.join(format!("{}.{}", self.device_name, DESCRIPTOR_EXTENSION))
    }
}
