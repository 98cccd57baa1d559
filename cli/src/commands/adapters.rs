use busforge_common::network::{interface, mac};
use colored::*;
use tracing::warn;

use crate::terminal::{colors, print};

pub fn adapters() -> anyhow::Result<()> {
    let adapters = interface::get_capture_adapters();
    if adapters.is_empty() {
        warn!("No adapter is up with a hardware address");
        print::no_results();
        return Ok(());
    }

    for (idx, adapter) in adapters.iter().enumerate() {
        print::tree_head(idx, &adapter.display_name());

        let mut lines = vec![("Id".to_string(), adapter.id.color(colors::TEXT_DEFAULT))];
        if let Some(mac_addr) = adapter.mac {
            lines.push((
                "MAC".to_string(),
                mac_addr.to_string().color(colors::MAC_ADDR),
            ));
            if let Some(vendor) = mac::get_vendor(mac_addr) {
                lines.push(("Vendor".to_string(), vendor.color(colors::VENDOR)));
            }
        }
        print::as_tree_one_level(lines);
    }

    Ok(())
}
