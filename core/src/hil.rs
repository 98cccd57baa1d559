//! # HiL regeneration
//!
//! The shared [`FOLDER_NAME`] folder under the PLC item is generated output and
//! is rebuilt from scratch on every run: registrations are cleared, the folder
//! is deleted, then the Profinet and the EtherCAT generator each fill in their
//! share of it. The first generator error aborts the run.

use std::collections::HashMap;

use busforge_common::project::{
    BusClass, IoDevice, ItemKind, ProjectConnector, ProjectError, TreeItem,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::descriptor::{DescriptorError, DeviceDescriptor, Signal};
use crate::xml::XmlError;

mod ethercat;
mod profinet;
mod program;

pub use ethercat::EtherCatGenerator;
pub use profinet::ProfinetGenerator;
pub use program::PlcProgram;

/// Folder shared by all generators.
pub const FOLDER_NAME: &str = "HiL";

#[derive(Debug, Error)]
pub enum HilError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error("device '{device}': {source}")]
    Descriptor {
        device: String,
        #[source]
        source: DescriptorError,
    },
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error("folder '{0}' disappeared during generation")]
    FolderMissing(String),
    #[error("devices '{first}' and '{second}' both map to program '{program}'")]
    ProgramCollision {
        program: String,
        first: String,
        second: String,
    },
}

/// Turns the IO devices of one bus class into PLC programs.
pub trait HilGenerator {
    fn bus(&self) -> BusClass;

    /// Prefix of generated program names, e.g. `PN_`.
    fn prefix(&self) -> &'static str;

    fn folder_name(&self) -> &str;

    /// Signals of one device, named as they should appear in the program.
    fn signals(&self, descriptor: &DeviceDescriptor) -> Vec<Signal>;

    /// Writes one program per device of this bus class into the shared folder.
    /// Returns how many programs were written.
    fn generate(
        &self,
        connector: &mut dyn ProjectConnector,
        root: &mut dyn TreeItem,
    ) -> Result<usize, HilError> {
        let mut devices: Vec<IoDevice> = connector
            .io_devices()
            .into_iter()
            .filter(|device| device.bus == self.bus())
            .collect();
        if devices.is_empty() {
            debug!("No {} devices", self.bus());
            return Ok(0);
        }
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        let folder_name = self.folder_name();
        if !root.has_child(folder_name) {
            root.create_child(folder_name, ItemKind::Folder)?;
        }
        let folder = root
            .lookup_child(folder_name)
            .ok_or_else(|| HilError::FolderMissing(folder_name.to_string()))?;

        let mut written: HashMap<String, &str> = HashMap::new();
        for device in &devices {
            let descriptor =
                DeviceDescriptor::parse(&device.xml).map_err(|source| HilError::Descriptor {
                    device: device.name.clone(),
                    source,
                })?;

            let program = PlcProgram::new(
                &format!("{}{}", self.prefix(), device.name),
                self.signals(&descriptor),
            );
            let name = program.name().to_string();
            if let Some(first) = written.insert(name.clone(), &device.name) {
                return Err(HilError::ProgramCollision {
                    program: name,
                    first: first.to_string(),
                    second: device.name.clone(),
                });
            }

            folder.delete_child(&name)?;
            folder
                .create_child(&name, ItemKind::Program)?
                .consume_xml(&program.to_xml()?)?;
            connector.register_hil_program(&name);

            info!("Generated {name} ({} signals)", program.signals().len());
        }

        Ok(devices.len())
    }
}

/// Rebuilds the HiL folder under `root`.
pub fn update(connector: &mut dyn ProjectConnector, root: &mut dyn TreeItem) -> Result<(), HilError> {
    connector.clear_hil_programs();
    if root.has_child(FOLDER_NAME) {
        root.delete_child(FOLDER_NAME)?;
        debug!("Deleted {FOLDER_NAME}");
    }

    let profinet = ProfinetGenerator::new(FOLDER_NAME);
    let ethercat = EtherCatGenerator::new(FOLDER_NAME);
    let generators: [&dyn HilGenerator; 2] = [&profinet, &ethercat];
    for generator in generators {
        generator.generate(connector, root)?;
    }

    info!(
        "{FOLDER_NAME} updated, {} program(s)",
        connector.hil_programs().len()
    );
    Ok(())
}
