use pnet::datalink::NetworkInterface;
#[cfg(target_os = "macos")]
use macos_impl::{is_physical, is_wireless};
#[cfg(target_os = "linux")]
use linux_impl::{is_physical, is_wireless};
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use fallback_impl::{is_physical, is_wireless};

use crate::network::adapter::NetworkAdapter;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// The interface was filtered out as "not physical" by the provided logic.
    NotPhysical,
    /// The interface does not have a MAC address.
    NoMacAddress,
    /// The interface is a point-to-point link (e.g., a VPN).
    IsPointToPoint,
}

/// Returns the adapters a field-bus capture can run on, wired ones first.
///
/// Field-bus traffic is layer 2, so unlike LAN discovery no IP address is required.
pub fn get_capture_adapters() -> Vec<NetworkAdapter> {
    let interfaces: Vec<NetworkInterface> = pnet::datalink::interfaces();
    capture_candidates(interfaces, is_physical, is_wired)
        .iter()
        .map(NetworkAdapter::from)
        .collect()
}

/// Picks the capture adapter named by `query` (id, name or display name).
pub fn select_adapter(query: &str, adapters: &[NetworkAdapter]) -> Option<NetworkAdapter> {
    adapters.iter().find(|adapter| adapter.matches(query)).cloned()
}

fn capture_candidates(
    interfaces: Vec<NetworkInterface>,
    is_physical: impl Fn(&NetworkInterface) -> bool,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Vec<NetworkInterface> {
    let mut viable: Vec<NetworkInterface> = interfaces
        .into_iter()
        .filter(|interface| is_viable_capture_interface(interface, &is_physical).is_ok())
        .collect();

    viable.sort_by_key(|interface| if is_wired(interface) { 0 } else { 1 });
    viable
}

fn is_viable_capture_interface(
    interface: &NetworkInterface,
    is_physical: impl Fn(&NetworkInterface) -> bool,
) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if interface.is_loopback() {
        return Err(ViabilityError::NotPhysical);
    }
    if !is_physical(interface) {
        return Err(ViabilityError::NotPhysical);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }

    Ok(())
}

fn is_wired(interface: &NetworkInterface) -> bool {
    is_physical(interface) && !is_wireless(interface)
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/device", interface.name)).exists()
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
    }
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use std::collections::HashSet;
    use std::process::Command;
    use std::sync::OnceLock;

    /// A struct to hold the cached hardware information
    struct HardwareInfo {
        physical_devices: HashSet<String>,
        wireless_devices: HashSet<String>,
    }

    /// Singleton that runs the shell commands only once on first access.
    fn get_hardware_info() -> &'static HardwareInfo {
        static HARDWARE_INFO: OnceLock<HardwareInfo> = OnceLock::new();

        HARDWARE_INFO.get_or_init(|| {
            let mut physical = HashSet::new();
            let mut wireless = HashSet::new();

            if let Ok(output) = Command::new("networksetup").arg("-listallhardwareports").output() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines() {
                    if let Some(device) = line.strip_prefix("Device: ") {
                        physical.insert(device.trim().to_string());
                    }
                }
            }

            for device in &physical {
                let is_wifi = Command::new("networksetup")
                    .arg("-getairportnetwork")
                    .arg(device)
                    .output()
                    .map(|out| out.status.success())
                    .unwrap_or(false);

                if is_wifi {
                    wireless.insert(device.clone());
                }
            }

            HardwareInfo {
                physical_devices: physical,
                wireless_devices: wireless,
            }
        })
    }

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        get_hardware_info().physical_devices.contains(&interface.name)
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        get_hardware_info().wireless_devices.contains(&interface.name)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod fallback_impl {
    use super::*;

    // Npcap lists only real adapters, loopback is filtered separately.
    pub fn is_physical(_interface: &NetworkInterface) -> bool {
        true
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        let description = interface.description.to_ascii_lowercase();
        description.contains("wireless") || description.contains("wi-fi")
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::util::MacAddr;

    const IFF_UP: u32 = 1;
    const IFF_BROADCAST: u32 = 1 << 1;
    const IFF_LOOPBACK: u32 = 1 << 3;
    const IFF_POINTTOPOINT: u32 = 1 << 4;

    fn create_mock_interface(name: &str, mac: Option<MacAddr>, flags: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: "An interface".to_string(),
            index: 0,
            mac,
            ips: vec![],
            flags,
        }
    }

    fn default_mac() -> Option<MacAddr> {
        Some(MacAddr(0x1, 0x2, 0x3, 0x4, 0x5, 0x6))
    }

    #[test]
    fn is_viable_capture_interface_should_succeed_without_ips() {
        let interface = create_mock_interface("eth0", default_mac(), IFF_UP | IFF_BROADCAST);
        let is_physical = |_: &NetworkInterface| -> bool { true };
        assert_eq!(is_viable_capture_interface(&interface, is_physical), Ok(()));
    }

    #[test]
    fn is_viable_capture_interface_should_fail_when_down() {
        let interface = create_mock_interface("eth0", default_mac(), IFF_BROADCAST);
        let is_physical = |_: &NetworkInterface| -> bool { true };
        assert_eq!(
            is_viable_capture_interface(&interface, is_physical),
            Err(ViabilityError::IsDown)
        );
    }

    #[test]
    fn is_viable_capture_interface_should_fail_loop_back() {
        let interface = create_mock_interface("lo", default_mac(), IFF_UP | IFF_LOOPBACK);
        let is_physical = |_: &NetworkInterface| -> bool { true };
        assert_eq!(
            is_viable_capture_interface(&interface, is_physical),
            Err(ViabilityError::NotPhysical)
        );
    }

    #[test]
    fn is_viable_capture_interface_should_fail_non_physical() {
        let interface = create_mock_interface("veth1234", default_mac(), IFF_UP | IFF_BROADCAST);
        let is_physical = |_: &NetworkInterface| -> bool { false };
        assert_eq!(
            is_viable_capture_interface(&interface, is_physical),
            Err(ViabilityError::NotPhysical)
        );
    }

    #[test]
    fn is_viable_capture_interface_should_fail_no_mac_addr() {
        let interface = create_mock_interface("eth0", None, IFF_UP | IFF_BROADCAST);
        let is_physical = |_: &NetworkInterface| -> bool { true };
        assert_eq!(
            is_viable_capture_interface(&interface, is_physical),
            Err(ViabilityError::NoMacAddress)
        );
    }

    #[test]
    fn is_viable_capture_interface_should_fail_point_to_point() {
        let interface =
            create_mock_interface("tun0", default_mac(), IFF_UP | IFF_POINTTOPOINT);
        let is_physical = |_: &NetworkInterface| -> bool { true };
        assert_eq!(
            is_viable_capture_interface(&interface, is_physical),
            Err(ViabilityError::IsPointToPoint)
        );
    }

    #[test]
    fn capture_candidates_put_wired_first_and_drop_unviable() {
        let interfaces = vec![
            create_mock_interface("wlan0", default_mac(), IFF_UP | IFF_BROADCAST),
            create_mock_interface("lo", default_mac(), IFF_UP | IFF_LOOPBACK),
            create_mock_interface("eth0", default_mac(), IFF_UP | IFF_BROADCAST),
        ];
        let is_physical = |_: &NetworkInterface| -> bool { true };
        let is_wired = |interface: &NetworkInterface| -> bool { interface.name == "eth0" };

        let names: Vec<String> = capture_candidates(interfaces, is_physical, is_wired)
            .into_iter()
            .map(|interface| interface.name)
            .collect();
        assert_eq!(names, vec!["eth0".to_string(), "wlan0".to_string()]);
    }

    #[test]
    fn select_adapter_by_display_name() {
        let adapters = vec![
            NetworkAdapter::new("eth0", "eth0", "Onboard", default_mac()),
            NetworkAdapter::new("eth1", "eth1", "Field bus", default_mac()),
        ];
        let selected = select_adapter("eth1 (Field bus)", &adapters);
        assert_eq!(selected.map(|a| a.id), Some("eth1".to_string()));
        assert!(select_adapter("eth2", &adapters).is_none());
    }
}
