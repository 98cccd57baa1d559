//! Normalizes the identity of scanned devices against a reference hardware file.
//!
//! The scanner only knows what the devices answered on the wire. The reference
//! file (`.hwml`) carries the names and identity numbers the project was
//! engineered with, and every box of the descriptor that the reference knows is
//! rewritten to match it.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::descriptor::{self, DescriptorError, DeviceDescriptor, NAME};
use crate::xml::{Document, Element, XmlError};

const REFERENCE_DEVICE: &str = "Device";
const REFERENCE_NAME: &str = "Name";

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("descriptor {path}: {source}")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },
    #[error("reference file {path}: {source}")]
    Reference {
        path: PathBuf,
        #[source]
        source: XmlError,
    },
    #[error("cannot read reference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One device of the reference file: its canonical name and identity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDevice {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceHardware {
    devices: Vec<ReferenceDevice>,
}

impl ReferenceHardware {
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let document = Document::parse(xml)?;
        let mut elements = Vec::new();
        let root = document.root();
        if root.is(REFERENCE_DEVICE) {
            elements.push(root);
        } else {
            root.collect(&|e: &Element| e.is(REFERENCE_DEVICE), &mut elements);
        }

        let devices = elements
            .into_iter()
            .filter_map(|element| {
                let name = element.attribute(REFERENCE_NAME)?.trim().to_string();
                let fields = element
                    .elements()
                    .filter(|field| field.elements().next().is_none())
                    .map(|field| (field.name(), field.text().trim().to_string()))
                    .filter(|(field, _)| field != NAME)
                    .collect();
                Some(ReferenceDevice { name, fields })
            })
            .collect();

        Ok(Self { devices })
    }

    pub fn load(path: &Path) -> Result<Self, PatchError> {
        let xml = fs::read_to_string(path).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml).map_err(|source| PatchError::Reference {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Device names are compared case-insensitively.
    pub fn find(&self, name: &str) -> Option<&ReferenceDevice> {
        self.devices
            .iter()
            .find(|device| device.name.eq_ignore_ascii_case(name))
    }

    pub fn devices(&self) -> &[ReferenceDevice] {
        &self.devices
    }
}

/// What a patch run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Boxes rewritten, by their normalized name.
    pub patched: Vec<String>,
    /// Boxes the reference does not know.
    pub unmatched: Vec<String>,
    /// `(box, field)` pairs the reference names but the box does not carry.
    pub skipped_fields: Vec<(String, String)>,
}

/// Patches the descriptor at `descriptor_path` in place.
pub fn run(descriptor_path: &Path, reference_path: &Path) -> Result<PatchReport, PatchError> {
    let descriptor_error = |source| PatchError::Descriptor {
        path: descriptor_path.to_path_buf(),
        source,
    };

    let reference = ReferenceHardware::load(reference_path)?;
    let mut descriptor = DeviceDescriptor::load(descriptor_path).map_err(descriptor_error)?;

    let report = patch(&mut descriptor, &reference);
    descriptor.save(descriptor_path).map_err(descriptor_error)?;

    info!(
        "Patched {} device(s) against {}",
        report.patched.len(),
        reference_path.display()
    );
    Ok(report)
}

pub fn patch(descriptor: &mut DeviceDescriptor, reference: &ReferenceHardware) -> PatchReport {
    let mut report = PatchReport::default();
    for element in descriptor.boxes_mut() {
        patch_box(element, reference, &mut report);
    }
    report
}

fn patch_box(element: &mut Element, reference: &ReferenceHardware, report: &mut PatchReport) {
    match descriptor::box_name(element) {
        Some(scanned) => match reference.find(&scanned) {
            Some(device) => normalize(element, device, report),
            None => {
                debug!("'{scanned}' is not in the reference file");
                report.unmatched.push(scanned);
            }
        },
        None => debug!("Skipping box without a name"),
    }

    for nested in descriptor::child_boxes_mut(element) {
        patch_box(nested, reference, report);
    }
}

fn normalize(element: &mut Element, device: &ReferenceDevice, report: &mut PatchReport) {
    if let Some(name) = element.child_mut(NAME) {
        name.set_text(&device.name);
    }

    for (field, value) in &device.fields {
        let target = element.find_mut(&|e: &Element| e.is(field), &descriptor::is_box);
        match target {
            Some(target) => target.set_text(value),
            None => {
                warn!("'{}' has no {field} to normalize", device.name);
                report
                    .skipped_fields
                    .push((device.name.clone(), field.clone()));
            }
        }
    }

    report.patched.push(device.name.clone());
}
