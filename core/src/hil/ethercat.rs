use busforge_common::project::BusClass;

use super::HilGenerator;
use crate::descriptor::{self, DeviceDescriptor, Signal};
use crate::xml::Element;

/// EtherCAT devices: couplers carry terminals as nested boxes, and every
/// signal is named after the path of boxes leading to it.
pub struct EtherCatGenerator {
    folder: String,
}

impl EtherCatGenerator {
    pub fn new(folder: &str) -> Self {
        Self {
            folder: folder.to_string(),
        }
    }
}

fn walk(element: &Element, path: &str, signals: &mut Vec<Signal>) {
    signals.extend(descriptor::box_signals(element).into_iter().map(|signal| Signal {
        name: format!("{path}_{}", signal.name),
        ..signal
    }));

    for (index, child) in descriptor::child_boxes(element).into_iter().enumerate() {
        let name = descriptor::box_name(child).unwrap_or_else(|| format!("Box{index}"));
        walk(child, &format!("{path}_{name}"), signals);
    }
}

impl HilGenerator for EtherCatGenerator {
    fn bus(&self) -> BusClass {
        BusClass::EtherCat
    }

    fn prefix(&self) -> &'static str {
        "EC_"
    }

    fn folder_name(&self) -> &str {
        &self.folder
    }

    fn signals(&self, descriptor: &DeviceDescriptor) -> Vec<Signal> {
        let mut signals = Vec::new();
        for (index, element) in descriptor.boxes().into_iter().enumerate() {
            let name = descriptor::box_name(element).unwrap_or_else(|| format!("Box{index}"));
            walk(element, &name, &mut signals);
        }
        signals
    }
}
