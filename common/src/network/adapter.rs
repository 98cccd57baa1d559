use std::fmt;

use pnet::datalink::NetworkInterface;
use pnet::util::MacAddr;

use crate::network::mac;

/// Prefix pcap puts in front of the adapter GUID on Windows.
const NPF_PREFIX: &str = "\\Device\\NPF_";

/// A network adapter a topology capture can run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAdapter {
    /// Platform identity handed to the scanner tool (`-d`).
    pub id: String,
    pub name: String,
    pub description: String,
    pub mac: Option<MacAddr>,
}

impl NetworkAdapter {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        mac: Option<MacAddr>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            mac,
        }
    }

    /// The composed `name (description)` string adapters are matched by.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.description)
    }

    /// Hardware address as stored in descriptors, empty when the adapter has none.
    pub fn physical_address(&self) -> String {
        self.mac.map(mac::physical_address).unwrap_or_default()
    }

    /// Whether `query` names this adapter by id, name or display name.
    pub fn matches(&self, query: &str) -> bool {
        self.id == query || self.name == query || self.display_name() == query
    }
}

impl fmt::Display for NetworkAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl From<&NetworkInterface> for NetworkAdapter {
    fn from(interface: &NetworkInterface) -> Self {
        let id = interface
            .name
            .strip_prefix(NPF_PREFIX)
            .unwrap_or(&interface.name)
            .to_string();
        let description = if interface.description.is_empty() {
            interface.name.clone()
        } else {
            interface.description.clone()
        };

        Self {
            id,
            name: interface.name.clone(),
            description,
            mac: interface.mac,
        }
    }
}

/// Source of the adapters currently present on this machine.
pub trait AdapterCatalog: Send + Sync {
    fn adapters(&self) -> Vec<NetworkAdapter>;
}

/// Enumerates every datalink interface of the host.
pub struct SystemAdapters;

impl AdapterCatalog for SystemAdapters {
    fn adapters(&self) -> Vec<NetworkAdapter> {
        pnet::datalink::interfaces()
            .iter()
            .map(NetworkAdapter::from)
            .collect()
    }
}

/// A fixed list of adapters.
impl AdapterCatalog for Vec<NetworkAdapter> {
    fn adapters(&self) -> Vec<NetworkAdapter> {
        self.clone()
    }
}

/// Finds the adapter whose composed display name equals `display_name` exactly.
pub fn find_by_display_name<'a>(
    adapters: &'a [NetworkAdapter],
    display_name: &str,
) -> Option<&'a NetworkAdapter> {
    adapters
        .iter()
        .find(|adapter| adapter.display_name() == display_name)
}
