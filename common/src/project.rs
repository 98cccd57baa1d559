//! # Host project ports
//!
//! Contracts the core uses to reach the engineering tool's project. The core only
//! consumes these; concrete sessions live in the adapters of `busforge-core`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project item '{0}' not found")]
    ItemNotFound(String),
    #[error("project item '{0}' already exists")]
    DuplicateItem(String),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid xml representation: {0}")]
    InvalidXml(String),
    #[error("invalid project file: {0}")]
    InvalidProject(String),
    #[error("project session is unavailable")]
    SessionPoisoned,
}

impl ProjectError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Protocol family of an IO device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BusClass {
    Profinet,
    EtherCat,
}

impl fmt::Display for BusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusClass::Profinet => f.write_str("Profinet"),
            BusClass::EtherCat => f.write_str("EtherCAT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    Device,
    Program,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Folder => "Folder",
            ItemKind::Device => "Device",
            ItemKind::Program => "Program",
        }
    }
}

impl FromStr for ItemKind {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Folder" => Ok(ItemKind::Folder),
            "Device" => Ok(ItemKind::Device),
            "Program" => Ok(ItemKind::Program),
            other => Err(ProjectError::InvalidProject(format!(
                "unknown item kind '{other}'"
            ))),
        }
    }
}

/// A node of the host project tree.
///
/// The full XML representation is opaque text to the tree: it is produced,
/// edited elsewhere and consumed back as a whole.
pub trait TreeItem {
    fn name(&self) -> &str;

    fn kind(&self) -> ItemKind;

    fn comment(&self) -> Option<&str>;

    fn set_comment(&mut self, comment: &str);

    fn produce_xml(&self) -> Result<String, ProjectError>;

    fn consume_xml(&mut self, xml: &str) -> Result<(), ProjectError>;

    fn child_names(&self) -> Vec<String>;

    fn has_child(&self, name: &str) -> bool {
        self.child_names().iter().any(|child| child == name)
    }

    fn lookup_child(&mut self, name: &str) -> Option<&mut dyn TreeItem>;

    fn create_child(&mut self, name: &str, kind: ItemKind)
    -> Result<&mut dyn TreeItem, ProjectError>;

    /// Deleting a child that does not exist is a no-op.
    fn delete_child(&mut self, name: &str) -> Result<(), ProjectError>;
}

/// The automation surface of an open project.
pub trait ProjectSession {
    /// Persists all pending project state.
    fn save_all(&mut self) -> Result<(), ProjectError>;

    /// Imports or merges the descriptor at `descriptor` as the IO device `name`.
    ///
    /// Returns `None` when the host declined to create a device from it.
    fn update_io_device(
        &mut self,
        name: &str,
        descriptor: &Path,
    ) -> Result<Option<&mut dyn TreeItem>, ProjectError>;
}

/// A session shared between the caller and a running capture.
pub type SharedSession = Arc<Mutex<dyn ProjectSession + Send>>;

/// Snapshot of one IO device of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoDevice {
    pub name: String,
    pub bus: BusClass,
    /// Full XML representation of the device item.
    pub xml: String,
}

/// What HiL generators need from the connected project besides the tree itself.
pub trait ProjectConnector {
    fn io_devices(&self) -> Vec<IoDevice>;

    fn clear_hil_programs(&mut self);

    fn register_hil_program(&mut self, name: &str);

    fn hil_programs(&self) -> Vec<String>;
}
