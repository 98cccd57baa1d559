//! The capture control: one scan-and-import cycle at a time.
//!
//! A request is rejected on the spot if a cycle is running or its settings are
//! incomplete. An accepted request runs the scanner and the importer on a
//! background thread; the busy state is held by a token owned by that thread
//! and released when it is dropped, whatever the cycle's outcome.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use busforge_common::capture::{Rejection, ScanSettings};
use busforge_common::config::Config;
use busforge_common::network::adapter::AdapterCatalog;
use busforge_common::project::SharedSession;
use tracing::{error, info, warn};

use crate::importer::{DeviceImporter, ImportOutcome};
use crate::scanner::{self, ScanJob, ScannerTool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Running,
}

/// Proof that this cycle owns the busy state. Resets it to idle on drop.
struct BusyToken {
    state: Arc<Mutex<CaptureState>>,
}

impl BusyToken {
    fn acquire(state: &Arc<Mutex<CaptureState>>) -> Option<Self> {
        let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == CaptureState::Running {
            return None;
        }
        *current = CaptureState::Running;
        Some(Self {
            state: Arc::clone(state),
        })
    }
}

impl Drop for BusyToken {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = CaptureState::Idle;
    }
}

/// A running capture cycle.
pub struct CaptureHandle {
    thread: JoinHandle<ImportOutcome>,
}

impl CaptureHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocks until the cycle is over.
    pub fn wait(self) -> ImportOutcome {
        self.thread.join().unwrap_or_else(|_| {
            error!("Capture cycle panicked");
            ImportOutcome::Failed
        })
    }
}

pub struct CaptureControl {
    scanner: Arc<dyn ScannerTool>,
    adapters: Arc<dyn AdapterCatalog>,
    session: SharedSession,
    project_folder: PathBuf,
    scan_duration: Duration,
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureControl {
    pub fn new(
        scanner: Arc<dyn ScannerTool>,
        adapters: Arc<dyn AdapterCatalog>,
        session: SharedSession,
        project_folder: impl Into<PathBuf>,
        config: &Config,
    ) -> Self {
        Self {
            scanner,
            adapters,
            session,
            project_folder: project_folder.into(),
            scan_duration: config.scan_duration,
            state: Arc::new(Mutex::new(CaptureState::Idle)),
        }
    }

    pub fn state(&self) -> CaptureState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.state() == CaptureState::Running
    }

    /// Starts a capture cycle in the background.
    ///
    /// Rejections are logged and returned; nothing has happened when one is.
    pub fn start_capture(&self, settings: ScanSettings) -> Result<CaptureHandle, Rejection> {
        let token = BusyToken::acquire(&self.state).ok_or_else(|| {
            warn!("{}", Rejection::Busy);
            Rejection::Busy
        })?;

        let request = settings.validate().inspect_err(|rejection| {
            error!("{}", capitalize(&rejection.to_string()));
        })?;

        let scanner = Arc::clone(&self.scanner);
        let importer = DeviceImporter::new(Arc::clone(&self.session), Arc::clone(&self.adapters));
        let artifact = request.artifact_path(&self.project_folder);
        let duration = self.scan_duration;

        info!(
            "Capturing '{}' on {}",
            request.device_name, request.adapter
        );

        let thread = thread::spawn(move || {
            let _token = token;
            let job = ScanJob {
                adapter_id: &request.adapter.id,
                duration,
                output: &artifact,
            };
            scanner::run_scanner(scanner.as_ref(), &job);
            importer.import(&request, &artifact)
        });

        Ok(CaptureHandle { thread })
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
