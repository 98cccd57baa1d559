#![cfg(test)]
use std::fs;
use std::path::Path;
use std::sync::Arc;

use busforge_common::events::SessionEvents;
use busforge_common::project::{ItemKind, ProjectConnector, ProjectSession, TreeItem};
use busforge_core::connector::ConfigConnector;
use busforge_core::hil::{self, FOLDER_NAME};
use busforge_core::project::XmlProject;
use tempfile::TempDir;

use crate::support::{ETHERCAT_DESCRIPTOR, PROFINET_DESCRIPTOR};

/// A saved project holding IO1 (Profinet), IO2 (EtherCAT) and an empty PLC folder.
fn plant(dir: &TempDir) -> anyhow::Result<()> {
    let mut project = XmlProject::create(
        dir.path().join("plant.bfproj"),
        "plant",
        Arc::new(SessionEvents::new()),
    )?;
    for (name, xml) in [("IO2", ETHERCAT_DESCRIPTOR), ("IO1", PROFINET_DESCRIPTOR)] {
        let artifact = dir.path().join(format!("{name}.xti"));
        fs::write(&artifact, xml)?;
        project.update_io_device(name, &artifact)?;
        fs::remove_file(&artifact)?;
    }
    project.root_mut().create_child("PLC", ItemKind::Folder)?;
    project.save_all()?;
    project.close();
    Ok(())
}

fn regenerate(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut project = XmlProject::open(dir.join("plant.bfproj"), Arc::new(SessionEvents::new()))?;
    let mut connector = ConfigConnector::open(dir.join("busforge.xml"), project.io_devices())?;
    let plc = project
        .item_mut("PLC")
        .ok_or_else(|| anyhow::anyhow!("no PLC folder"))?;

    hil::update(&mut connector, plc)?;

    connector.save()?;
    project.save_all()?;
    project.close();
    Ok(connector.hil_programs())
}

fn hil_folder(dir: &Path) -> anyhow::Result<Vec<(String, String)>> {
    let project = XmlProject::open(dir.join("plant.bfproj"), Arc::new(SessionEvents::new()))?;
    let folder = project
        .root()
        .child("PLC")
        .and_then(|plc| plc.child(FOLDER_NAME))
        .ok_or_else(|| anyhow::anyhow!("no {FOLDER_NAME} folder"))?;
    folder
        .children()
        .iter()
        .map(|program| -> anyhow::Result<(String, String)> {
            Ok((program.name().to_string(), program.produce_xml()?))
        })
        .collect()
}

#[test]
fn programs_are_written_to_project_and_config() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    plant(&dir)?;

    let programs = regenerate(dir.path())?;
    assert_eq!(programs, vec!["PN_IO1", "EC_IO2"]);

    let folder = hil_folder(dir.path())?;
    let names: Vec<&str> = folder.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["PN_IO1", "EC_IO2"]);

    let (_, profinet) = &folder[0];
    assert!(profinet.contains("PROGRAM PN_IO1"));
    assert!(profinet.contains("im155_6pn_DI_0 AT %Q* : BOOL;"));
    assert!(profinet.contains("im155_6pn_DI_1 AT %Q* : BOOL;"));
    assert!(profinet.contains("im155_6pn_DQ_0 AT %I* : BOOL;"));

    let (_, ethercat) = &folder[1];
    assert!(ethercat.contains("PROGRAM EC_IO2"));
    assert!(ethercat.contains("EK1100_EL1004_Input_1 AT %Q* : BIT;"));
    assert!(ethercat.contains("EK1100_EL3102_Value AT %Q* : INT;"));

    let config = fs::read_to_string(dir.path().join("busforge.xml"))?;
    assert!(config.contains(
        "<HilPrograms><Program>PN_IO1</Program><Program>EC_IO2</Program></HilPrograms>"
    ));
    Ok(())
}

#[test]
fn regeneration_is_idempotent() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    plant(&dir)?;

    regenerate(dir.path())?;
    let first = hil_folder(dir.path())?;
    let first_config = fs::read_to_string(dir.path().join("busforge.xml"))?;

    let programs = regenerate(dir.path())?;
    assert_eq!(programs, vec!["PN_IO1", "EC_IO2"]);
    assert_eq!(hil_folder(dir.path())?, first);
    assert_eq!(fs::read_to_string(dir.path().join("busforge.xml"))?, first_config);
    Ok(())
}

#[test]
fn foreign_config_entries_survive() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    plant(&dir)?;
    fs::write(
        dir.path().join("busforge.xml"),
        "<Config><Target Ip=\"10.0.0.5\"/><HilPrograms><Program>PN_Gone</Program></HilPrograms></Config>",
    )?;

    let programs = regenerate(dir.path())?;

    assert_eq!(programs, vec!["PN_IO1", "EC_IO2"]);
    let config = fs::read_to_string(dir.path().join("busforge.xml"))?;
    assert!(config.contains("<Target Ip=\"10.0.0.5\"/>"));
    assert!(!config.contains("PN_Gone"));
    Ok(())
}

#[test]
fn project_without_devices_gets_no_folder() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut project = XmlProject::create(
        dir.path().join("plant.bfproj"),
        "plant",
        Arc::new(SessionEvents::new()),
    )?;
    project.root_mut().create_child("PLC", ItemKind::Folder)?;
    project.save_all()?;
    project.close();

    assert!(regenerate(dir.path())?.is_empty());
    assert!(hil_folder(dir.path()).is_err());
    Ok(())
}
