use std::fmt::Write;
use std::sync::OnceLock;

use mac_oui::Oui;
use pnet::util::MacAddr;
use tracing::debug;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

/// Retrieves or initializes the **Organizationally unique identifier** database.
///
/// Used for linking a vendor to an adapter's MAC address when listing adapters.
fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                debug!("OUI database unavailable: {e}");
                None
            }
        })
        .as_ref()
}

/// Identify the vendor of a MAC address.
pub fn get_vendor(mac: MacAddr) -> Option<String> {
    let db = get_oui_db()?;
    let mac_str = mac.to_string();
    match db.lookup_by_mac(&mac_str) {
        Ok(Some(entry)) => Some(entry.company_name.clone()),
        _ => None,
    }
}

/// Renders a MAC address the way device descriptors store it:
/// uppercase hex octets without separators (`00155D0A0B0C`).
pub fn physical_address(mac: MacAddr) -> String {
    let octets: [u8; 6] = [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5];
    octets.iter().fold(String::with_capacity(12), |mut out, octet| {
        let _ = write!(out, "{octet:02X}");
        out
    })
}
