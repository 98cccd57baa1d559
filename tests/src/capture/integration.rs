#![cfg(test)]
use std::sync::Arc;

use busforge_common::capture::{Rejection, ScanSettings};
use busforge_common::events::SessionEvents;
use busforge_common::network::adapter::NetworkAdapter;
use busforge_common::project::{ProjectSession, TreeItem};
use busforge_core::capture::CaptureState;
use busforge_core::descriptor::{AddressInfo, DeviceDescriptor};
use busforge_core::importer::ImportOutcome;
use busforge_core::project::XmlProject;

use crate::support::{
    FakeScanner, GatedScanner, PROFINET_DESCRIPTOR, REFERENCE_HARDWARE, Workspace, adapter_a,
};

fn device_descriptor(workspace: &Workspace, device: &str) -> (Option<String>, DeviceDescriptor) {
    let mut project = workspace.project.lock().unwrap();
    let item = project
        .item_mut(&format!("IO/{device}"))
        .expect("device item");
    let descriptor = DeviceDescriptor::parse(&item.produce_xml().unwrap()).unwrap();
    (item.comment().map(str::to_string), descriptor)
}

/*************************************************************
                     Successful captures
**************************************************************/

#[test]
fn capture_without_reference_binds_adapter() {
    let scanner = Arc::new(FakeScanner::writing(PROFINET_DESCRIPTOR));
    let workspace = Workspace::new(scanner.clone(), vec![adapter_a()]);

    let outcome = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))
        .unwrap()
        .wait();

    assert_eq!(
        outcome,
        ImportOutcome::Imported {
            device: "IO1".into()
        }
    );
    assert_eq!(scanner.launches(), 1);
    assert_eq!(
        scanner.last_adapter.lock().unwrap().as_deref(),
        Some(adapter_a().id.as_str())
    );
    assert!(!workspace.artifact("IO1").exists());

    let (comment, descriptor) = device_descriptor(&workspace, "IO1");
    assert_eq!(comment, None);
    let address = descriptor.address_info().unwrap();
    assert_eq!(address, AddressInfo::for_adapter(&adapter_a()));
    assert_eq!(
        address.device_desc,
        "Ethernet 2 (Intel(R) Ethernet Controller I210)"
    );
    assert_eq!(
        address.device_name,
        "\\DEVICE\\{5A1D0C3E-17B2-4F0E-9C47-0A1B2C3D4E5F}"
    );
    assert_eq!(address.device_data, "001B21AABBCC");
}

#[test]
fn binding_preserves_untargeted_fields() {
    let workspace = Workspace::new(
        Arc::new(FakeScanner::writing(PROFINET_DESCRIPTOR)),
        vec![adapter_a()],
    );

    workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))
        .unwrap()
        .wait();

    let (_, descriptor) = device_descriptor(&workspace, "IO1");
    let expected = PROFINET_DESCRIPTOR
        .trim_start_matches("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n")
        .trim_end()
        .replace(
            "<DeviceDesc>unknown</DeviceDesc>",
            "<DeviceDesc>Ethernet 2 (Intel(R) Ethernet Controller I210)</DeviceDesc>",
        )
        .replace(
            "\\DEVICE\\{00000000}",
            "\\DEVICE\\{5A1D0C3E-17B2-4F0E-9C47-0A1B2C3D4E5F}",
        )
        .replace("000000000000", "001B21AABBCC");
    assert_eq!(descriptor.to_xml().unwrap(), expected);
}

#[test]
fn capture_with_reference_normalizes_and_comments() {
    let workspace = Workspace::new(
        Arc::new(FakeScanner::writing(PROFINET_DESCRIPTOR)),
        vec![adapter_a()],
    );
    let reference = workspace.write_file("hw.hwml", REFERENCE_HARDWARE);

    let outcome = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())).with_reference(&reference))
        .unwrap()
        .wait();

    assert!(matches!(outcome, ImportOutcome::Imported { .. }));
    let (comment, descriptor) = device_descriptor(&workspace, "IO1");
    assert_eq!(comment.as_deref(), Some(reference.to_string_lossy().as_ref()));

    let xml = descriptor.to_xml().unwrap();
    assert!(xml.contains("<Name>IM155-6PN</Name>"));
    assert!(xml.contains("<VendorId>42</VendorId>"));
    assert!(xml.contains("<DeviceId>788</DeviceId>"));
    assert_eq!(
        descriptor.address_info(),
        Some(AddressInfo::for_adapter(&adapter_a()))
    );
}

#[test]
fn nonzero_scanner_exit_still_imports() {
    let scanner = Arc::new(FakeScanner::writing(PROFINET_DESCRIPTOR).exiting_with(3));
    let workspace = Workspace::new(scanner, vec![adapter_a()]);

    let outcome = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))
        .unwrap()
        .wait();

    assert!(matches!(outcome, ImportOutcome::Imported { .. }));
}

#[test]
fn capture_is_saved_to_the_project_file() -> anyhow::Result<()> {
    let workspace = Workspace::new(
        Arc::new(FakeScanner::writing(PROFINET_DESCRIPTOR)),
        vec![adapter_a()],
    );
    workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))?
        .wait();

    workspace.project.lock().unwrap().save_all()?;

    let reopened = XmlProject::open(workspace.project_path(), Arc::new(SessionEvents::new()))?;
    let devices = reopened.io_devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "IO1");
    Ok(())
}

#[tokio::test]
async fn capture_can_be_awaited_from_async_code() {
    let workspace = Workspace::new(
        Arc::new(FakeScanner::writing(PROFINET_DESCRIPTOR)),
        vec![adapter_a()],
    );
    let handle = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))
        .unwrap();

    let outcome = tokio::task::spawn_blocking(move || handle.wait())
        .await
        .unwrap();

    assert!(matches!(outcome, ImportOutcome::Imported { .. }));
    assert_eq!(workspace.control.state(), CaptureState::Idle);
}

/*************************************************************
                     No-op captures
**************************************************************/

#[test]
fn missing_artifact_is_a_no_op() {
    let workspace = Workspace::new(Arc::new(FakeScanner::silent()), vec![adapter_a()]);

    let outcome = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))
        .unwrap()
        .wait();

    assert_eq!(outcome, ImportOutcome::NothingCreated);
    assert!(workspace.project.lock().unwrap().io_devices().is_empty());
}

#[test]
fn empty_artifact_is_deleted_without_import() {
    let scanner = Arc::new(FakeScanner::writing(""));
    let workspace = Workspace::new(scanner, vec![adapter_a()]);

    let outcome = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))
        .unwrap()
        .wait();

    assert_eq!(outcome, ImportOutcome::NothingCreated);
    assert!(!workspace.artifact("IO1").exists());
    assert!(workspace.project.lock().unwrap().io_devices().is_empty());
}

#[test]
fn unmatched_adapter_leaves_address_from_scan() {
    let other = NetworkAdapter::new("eth9", "Ethernet 9", "USB NIC", None);
    let workspace = Workspace::new(
        Arc::new(FakeScanner::writing(PROFINET_DESCRIPTOR)),
        vec![other],
    );

    let outcome = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))
        .unwrap()
        .wait();

    assert!(matches!(outcome, ImportOutcome::Imported { .. }));
    let (_, descriptor) = device_descriptor(&workspace, "IO1");
    assert_eq!(descriptor.address_info().unwrap().device_desc, "unknown");
}

/*************************************************************
                     Failures and rejections
**************************************************************/

#[test]
fn malformed_descriptor_fails_and_cleans_up() {
    let workspace = Workspace::new(
        Arc::new(FakeScanner::writing("<TreeItem><DeviceDef>")),
        vec![adapter_a()],
    );
    let reference = workspace.write_file("hw.hwml", REFERENCE_HARDWARE);

    let outcome = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())).with_reference(reference))
        .unwrap()
        .wait();

    assert_eq!(outcome, ImportOutcome::Failed);
    assert!(!workspace.artifact("IO1").exists());
    assert!(!workspace.control.is_busy());
}

#[test]
fn invalid_settings_never_launch_the_scanner() {
    let scanner = Arc::new(FakeScanner::writing(PROFINET_DESCRIPTOR));
    let workspace = Workspace::new(scanner.clone(), vec![adapter_a()]);

    let empty_name = workspace
        .control
        .start_capture(ScanSettings::new("", Some(adapter_a())));
    let no_adapter = workspace.control.start_capture(ScanSettings::new("IO1", None));
    let escaping = workspace
        .control
        .start_capture(ScanSettings::new("../IO1", Some(adapter_a())));

    assert_eq!(empty_name.err(), Some(Rejection::EmptyDeviceName));
    assert_eq!(escaping.err(), Some(Rejection::InvalidDeviceName));
    assert_eq!(no_adapter.err(), Some(Rejection::NoAdapter));
    assert_eq!(scanner.launches(), 0);
    assert!(!workspace.artifact("IO1").exists());
}

#[test]
fn busy_control_rejects_second_capture() {
    let (scanner, started, release) =
        GatedScanner::new(FakeScanner::writing(PROFINET_DESCRIPTOR));
    let scanner = Arc::new(scanner);
    let workspace = Workspace::new(scanner.clone(), vec![adapter_a()]);

    let first = workspace
        .control
        .start_capture(ScanSettings::new("IO1", Some(adapter_a())))
        .unwrap();
    started.recv().unwrap();

    let second = workspace
        .control
        .start_capture(ScanSettings::new("IO2", Some(adapter_a())));
    assert_eq!(second.err(), Some(Rejection::Busy));

    release.send(()).unwrap();
    assert_eq!(
        first.wait(),
        ImportOutcome::Imported {
            device: "IO1".into()
        }
    );
    assert_eq!(scanner.launches(), 1);
    assert!(!workspace.artifact("IO2").exists());

    let devices = workspace.project.lock().unwrap().io_devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "IO1");
}
