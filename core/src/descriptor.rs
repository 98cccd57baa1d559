//! # Device descriptor field paths
//!
//! Every element name of the scanner's descriptor format is known here and
//! nowhere else. The patcher, the importer and the HiL generators go through
//! [`DeviceDescriptor`] and the free functions below instead of walking the
//! tree themselves.

use std::fs;
use std::path::{Path, PathBuf};

use busforge_common::network::adapter::NetworkAdapter;
use busforge_common::project::BusClass;
use thiserror::Error;

use crate::xml::{Document, Element, XmlError};

pub const DEVICE_DEF: &str = "DeviceDef";
const DEV_TYPE: &str = "DevType";
const ADDRESS_INFO: &str = "AddressInfo";
const PNP: &str = "Pnp";
const DEVICE_DESC: &str = "DeviceDesc";
const DEVICE_NAME: &str = "DeviceName";
const DEVICE_DATA: &str = "DeviceData";

pub const BOX: &str = "Box";
pub const NAME: &str = "Name";
const INPUT: &str = "Input";
const OUTPUT: &str = "Output";
const TYPE: &str = "Type";

/// Prefix of the device name the host expects in front of the adapter id.
pub const DEVICE_PATH_PREFIX: &str = "\\DEVICE\\";

/// Signals without a declared type are exchanged as raw bytes.
const DEFAULT_SIGNAL_TYPE: &str = "BYTE";

const ETHERCAT_DEV_TYPES: &[u32] = &[111];
const PROFINET_DEV_TYPES: &[u32] = &[113, 115];

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error("descriptor has no <{0}> element")]
    MissingElement(&'static str),
    #[error("cannot access descriptor {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Identity of the adapter a device is reached through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInfo {
    pub device_desc: String,
    pub device_name: String,
    /// Hardware address of the adapter.
    pub device_data: String,
}

impl AddressInfo {
    pub fn for_adapter(adapter: &NetworkAdapter) -> Self {
        Self {
            device_desc: adapter.display_name(),
            device_name: format!("{DEVICE_PATH_PREFIX}{}", adapter.id),
            device_data: adapter.physical_address(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// One process-data entry of a box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: String,
    pub data_type: String,
    pub direction: Direction,
}

/// A descriptor document known to carry a device definition.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    document: Document,
}

impl DeviceDescriptor {
    pub fn parse(xml: &str) -> Result<Self, DescriptorError> {
        Self::from_document(Document::parse(xml)?)
    }

    pub fn from_document(document: Document) -> Result<Self, DescriptorError> {
        if !is_device_descriptor(&document) {
            return Err(DescriptorError::MissingElement(DEVICE_DEF));
        }
        Ok(Self { document })
    }

    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let xml = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    pub fn save(&self, path: &Path) -> Result<(), DescriptorError> {
        let xml = self.document.to_xml()?;
        fs::write(path, xml).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_xml(&self) -> Result<String, DescriptorError> {
        Ok(self.document.to_xml()?)
    }

    fn device_def(&self) -> Option<&Element> {
        self.document.root().child(DEVICE_DEF)
    }

    fn device_def_mut(&mut self) -> Option<&mut Element> {
        self.document.root_mut().child_mut(DEVICE_DEF)
    }

    pub fn bus_class(&self) -> Option<BusClass> {
        let dev_type: u32 = self.device_def()?.attribute(DEV_TYPE)?.trim().parse().ok()?;
        if ETHERCAT_DEV_TYPES.contains(&dev_type) {
            Some(BusClass::EtherCat)
        } else if PROFINET_DEV_TYPES.contains(&dev_type) {
            Some(BusClass::Profinet)
        } else {
            None
        }
    }

    pub fn address_info(&self) -> Option<AddressInfo> {
        let pnp = self.device_def()?.path(&[ADDRESS_INFO, PNP])?;
        let field = |name: &str| pnp.child(name).map(Element::text).unwrap_or_default();

        Some(AddressInfo {
            device_desc: field(DEVICE_DESC),
            device_name: field(DEVICE_NAME),
            device_data: field(DEVICE_DATA),
        })
    }

    /// Rewrites the address fields. Leaves are added when missing, but a
    /// descriptor without an address block is left alone and `false` returned.
    pub fn set_address_info(&mut self, info: &AddressInfo) -> bool {
        let Some(pnp) = self
            .device_def_mut()
            .and_then(|def| def.path_mut(&[ADDRESS_INFO, PNP]))
        else {
            return false;
        };

        pnp.set_child_text(DEVICE_DESC, &info.device_desc);
        pnp.set_child_text(DEVICE_NAME, &info.device_name);
        pnp.set_child_text(DEVICE_DATA, &info.device_data);
        true
    }

    /// Outermost boxes of the device, in document order.
    pub fn boxes(&self) -> Vec<&Element> {
        let mut boxes = Vec::new();
        if let Some(def) = self.device_def() {
            def.collect(&is_box, &mut boxes);
        }
        boxes
    }

    /// Outermost boxes, mutable, in document order.
    pub fn boxes_mut(&mut self) -> Vec<&mut Element> {
        match self.device_def_mut() {
            Some(def) => child_boxes_mut(def),
            None => Vec::new(),
        }
    }
}

pub fn is_device_descriptor(document: &Document) -> bool {
    document.root().child(DEVICE_DEF).is_some()
}

pub fn is_box(element: &Element) -> bool {
    element.is(BOX)
}

pub fn box_name(element: &Element) -> Option<String> {
    element
        .child(NAME)
        .map(Element::text)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Boxes directly nested in `element`, looking through grouping elements.
pub fn child_boxes(element: &Element) -> Vec<&Element> {
    let mut boxes = Vec::new();
    element.collect(&is_box, &mut boxes);
    boxes
}

pub fn child_boxes_mut(element: &mut Element) -> Vec<&mut Element> {
    let mut boxes = Vec::new();
    for child in element.elements_mut() {
        if is_box(child) {
            boxes.push(child);
        } else {
            boxes.extend(child_boxes_mut(child));
        }
    }
    boxes
}

/// Signals of a box and of its modules, without those of nested boxes.
pub fn box_signals(element: &Element) -> Vec<Signal> {
    let mut signals = Vec::new();
    collect_signals(element, &mut signals);
    signals
}

fn collect_signals(element: &Element, signals: &mut Vec<Signal>) {
    for child in element.elements() {
        let direction = if child.is(INPUT) {
            Direction::Input
        } else if child.is(OUTPUT) {
            Direction::Output
        } else {
            if !is_box(child) {
                collect_signals(child, signals);
            }
            continue;
        };

        let Some(name) = child.child(NAME).map(Element::text) else {
            continue;
        };
        let data_type = child
            .child(TYPE)
            .map(Element::text)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SIGNAL_TYPE.to_string());

        signals.push(Signal {
            name: name.trim().to_string(),
            data_type: data_type.trim().to_string(),
            direction,
        });
    }
}
