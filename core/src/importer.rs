//! Imports a scanned descriptor into the host project.
//!
//! The sequence is save, check the artifact, optionally patch it, import it,
//! delete it, then bind the new device to the adapter it was scanned on. Every
//! failure is logged here and turned into [`ImportOutcome::Failed`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use busforge_common::capture::CaptureRequest;
use busforge_common::network::adapter::{self, AdapterCatalog};
use busforge_common::project::{ProjectError, SharedSession, TreeItem};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::descriptor::{AddressInfo, DescriptorError, DeviceDescriptor};
use crate::patcher::{self, PatchError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { device: String },
    /// The scan produced nothing to import.
    NothingCreated,
    Failed,
}

#[derive(Debug, Error)]
enum ImportError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("cannot read {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The descriptor file left by the scanner. Deleted when dropped.
struct ScanArtifact<'a> {
    path: &'a Path,
}

impl<'a> ScanArtifact<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<String, ImportError> {
        fs::read_to_string(self.path).map_err(|source| ImportError::Artifact {
            path: self.path.to_path_buf(),
            source,
        })
    }
}

impl Drop for ScanArtifact<'_> {
    fn drop(&mut self) {
        match fs::remove_file(self.path) {
            Ok(()) => debug!("Deleted {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not delete {}: {e}", self.path.display()),
        }
    }
}

pub struct DeviceImporter {
    session: SharedSession,
    adapters: Arc<dyn AdapterCatalog>,
}

impl DeviceImporter {
    pub fn new(session: SharedSession, adapters: Arc<dyn AdapterCatalog>) -> Self {
        Self { session, adapters }
    }

    /// Imports the descriptor at `artifact` as `request.device_name`.
    pub fn import(&self, request: &CaptureRequest, artifact: &Path) -> ImportOutcome {
        match self.try_import(request, artifact) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Import of '{}' failed: {e}", request.device_name);
                ImportOutcome::Failed
            }
        }
    }

    fn try_import(
        &self,
        request: &CaptureRequest,
        artifact_path: &Path,
    ) -> Result<ImportOutcome, ImportError> {
        // owns the file from here on, whichever way the attempt ends
        let artifact = ScanArtifact::new(artifact_path);

        let mut session = self
            .session
            .lock()
            .map_err(|_| ProjectError::SessionPoisoned)?;
        session.save_all()?;

        if !artifact.path.exists() {
            info!("Nothing created");
            return Ok(ImportOutcome::NothingCreated);
        }

        if artifact.read()?.trim().is_empty() {
            info!("Nothing created");
            return Ok(ImportOutcome::NothingCreated);
        }

        if let Some(reference) = &request.reference {
            patcher::run(artifact.path, reference)?;
        }

        info!("Import {}...", artifact.path.display());
        let imported = session.update_io_device(&request.device_name, artifact.path);
        drop(artifact);

        let Some(device) = imported? else {
            info!("Nothing created");
            return Ok(ImportOutcome::NothingCreated);
        };
        self.annotate(device, request)?;

        info!("Finished");
        Ok(ImportOutcome::Imported {
            device: request.device_name.clone(),
        })
    }

    fn annotate(&self, device: &mut dyn TreeItem, request: &CaptureRequest) -> Result<(), ImportError> {
        if let Some(reference) = &request.reference {
            device.set_comment(&reference.to_string_lossy());
        }

        let wanted = request.adapter.display_name();
        let adapters = self.adapters.adapters();
        let Some(adapter) = adapter::find_by_display_name(&adapters, &wanted) else {
            debug!("No adapter named '{wanted}' on this machine");
            return Ok(());
        };

        let mut descriptor = match DeviceDescriptor::parse(&device.produce_xml()?) {
            Ok(descriptor) => descriptor,
            Err(DescriptorError::MissingElement(element)) => {
                debug!("'{}' has no <{element}>, address left as is", device.name());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if !descriptor.set_address_info(&AddressInfo::for_adapter(adapter)) {
            debug!("'{}' has no address block", device.name());
            return Ok(());
        }

        device.consume_xml(&descriptor.to_xml()?)?;
        info!("Bound '{}' to {}", device.name(), adapter.display_name());
        Ok(())
    }
}
