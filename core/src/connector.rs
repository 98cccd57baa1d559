//! Project connector persisting generated HiL programs in the config file.

use std::fs;
use std::path::{Path, PathBuf};

use busforge_common::project::{IoDevice, ProjectConnector, ProjectError};
use tracing::debug;

use crate::xml::{Document, Element};

/// Config file written next to the project unless another one is given.
pub const DEFAULT_CONFIG_FILE: &str = "busforge.xml";

const CONFIG: &str = "Config";
const HIL_PROGRAMS: &str = "HilPrograms";
const PROGRAM: &str = "Program";

pub struct ConfigConnector {
    path: PathBuf,
    document: Document,
    devices: Vec<IoDevice>,
    programs: Vec<String>,
}

impl ConfigConnector {
    /// Opens the config at `path`, or starts an empty one if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>, devices: Vec<IoDevice>) -> Result<Self, ProjectError> {
        let path = path.into();
        let document = if path.exists() {
            let xml = fs::read_to_string(&path).map_err(|e| ProjectError::io(&path, e))?;
            Document::parse(&xml).map_err(|e| ProjectError::InvalidXml(e.to_string()))?
        } else {
            debug!("{} does not exist yet", path.display());
            Document::new(Element::new(CONFIG))
        };

        let programs = document
            .root()
            .child(HIL_PROGRAMS)
            .map(|list| {
                list.elements()
                    .filter(|element| element.is(PROGRAM))
                    .map(Element::text)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            path,
            document,
            devices,
            programs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the registered programs back, leaving the rest of the file as it was.
    pub fn save(&mut self) -> Result<(), ProjectError> {
        let root = self.document.root_mut();
        root.remove_children(HIL_PROGRAMS);

        let mut list = Element::new(HIL_PROGRAMS);
        for program in &self.programs {
            list.push(Element::new(PROGRAM).with_text(program));
        }
        root.push(list);

        let xml = self
            .document
            .to_xml()
            .map_err(|e| ProjectError::InvalidXml(e.to_string()))?;
        fs::write(&self.path, xml).map_err(|e| ProjectError::io(&self.path, e))
    }
}

impl ProjectConnector for ConfigConnector {
    fn io_devices(&self) -> Vec<IoDevice> {
        self.devices.clone()
    }

    fn clear_hil_programs(&mut self) {
        self.programs.clear();
    }

    fn register_hil_program(&mut self, name: &str) {
        if !self.programs.iter().any(|program| program == name) {
            self.programs.push(name.to_string());
        }
    }

    fn hil_programs(&self) -> Vec<String> {
        self.programs.clone()
    }
}
