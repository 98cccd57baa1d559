use std::collections::HashSet;

use crate::descriptor::{Direction, Signal};
use crate::xml::{Element, XmlError};

const PLC_OBJECT_VERSION: &str = "1.1.0.1";

/// A generated structured-text program mirroring a device's process image.
///
/// The device's inputs are driven by the simulation, so they are declared as
/// outputs (`%Q*`) of the program, and the device's outputs as inputs (`%I*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlcProgram {
    name: String,
    signals: Vec<Signal>,
}

impl PlcProgram {
    pub fn new(name: &str, signals: Vec<Signal>) -> Self {
        Self {
            name: identifier(name),
            signals,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Variable names of the signals, in order. A name already taken gets the
    /// first free `_2`, `_3`, ... suffix.
    pub fn variables(&self) -> Vec<String> {
        let mut taken = HashSet::new();
        self.signals
            .iter()
            .map(|signal| {
                let base = identifier(&signal.name);
                let mut name = base.clone();
                let mut counter = 2;
                while !taken.insert(name.clone()) {
                    name = format!("{base}_{counter}");
                    counter += 1;
                }
                name
            })
            .collect()
    }

    pub fn declaration(&self) -> String {
        let mut text = format!("PROGRAM {}\nVAR\n", self.name);
        for (variable, signal) in self.variables().iter().zip(&self.signals) {
            let location = match signal.direction {
                Direction::Input => "%Q*",
                Direction::Output => "%I*",
            };
            text.push_str(&format!(
                "    {variable} AT {location} : {};\n",
                signal.data_type
            ));
        }
        text.push_str("END_VAR\n");
        text
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        Element::new("TcPlcObject")
            .with_attribute("Version", PLC_OBJECT_VERSION)
            .with_child(
                Element::new("POU")
                    .with_attribute("Name", &self.name)
                    .with_child(Element::new("Declaration").with_cdata(&self.declaration()))
                    .with_child(
                        Element::new("Implementation")
                            .with_child(Element::new("ST").with_cdata("")),
                    ),
            )
            .to_xml()
    }
}

/// Maps `name` onto a valid IEC 61131-3 identifier.
pub fn identifier(name: &str) -> String {
    let mut id: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    while id.contains("__") {
        id = id.replace("__", "_");
    }
    let id = id.trim_end_matches('_').to_string();
    match id.chars().next() {
        Some(first) if first.is_ascii_digit() => format!("_{id}"),
        Some(_) => id,
        None => "_".to_string(),
    }
}
