use busforge_common::project::BusClass;

use super::HilGenerator;
use crate::descriptor::{self, DeviceDescriptor, Signal};

/// Profinet devices: every box contributes its module signals, flattened.
pub struct ProfinetGenerator {
    folder: String,
}

impl ProfinetGenerator {
    pub fn new(folder: &str) -> Self {
        Self {
            folder: folder.to_string(),
        }
    }
}

impl HilGenerator for ProfinetGenerator {
    fn bus(&self) -> BusClass {
        BusClass::Profinet
    }

    fn prefix(&self) -> &'static str {
        "PN_"
    }

    fn folder_name(&self) -> &str {
        &self.folder
    }

    fn signals(&self, descriptor: &DeviceDescriptor) -> Vec<Signal> {
        let mut signals = Vec::new();
        for (index, element) in descriptor.boxes().into_iter().enumerate() {
            let box_name =
                descriptor::box_name(element).unwrap_or_else(|| format!("Box{index}"));
            signals.extend(descriptor::box_signals(element).into_iter().map(|signal| Signal {
                name: format!("{box_name}_{}", signal.name),
                ..signal
            }));
        }
        signals
    }
}
