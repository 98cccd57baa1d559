use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use busforge_common::events::SessionEvents;
use busforge_common::project::{ItemKind, ProjectConnector, ProjectSession, TreeItem};
use busforge_core::connector::{ConfigConnector, DEFAULT_CONFIG_FILE};
use busforge_core::hil;
use busforge_core::project::XmlProject;
use colored::*;
use tracing::warn;

use crate::terminal::{colors, print};

pub fn hil(project_path: &Path, plc: &str, config: Option<PathBuf>) -> anyhow::Result<()> {
    let mut project = XmlProject::open(project_path, Arc::new(SessionEvents::new()))
        .with_context(|| format!("cannot open {}", project_path.display()))?;
    let config_path = config.unwrap_or_else(|| project.folder().join(DEFAULT_CONFIG_FILE));
    let mut connector = ConfigConnector::open(&config_path, project.io_devices())
        .with_context(|| format!("cannot open {}", config_path.display()))?;

    if project.item_mut(plc).is_none() {
        if plc.contains('/') {
            bail!("no item '{plc}' in {}", project_path.display());
        }
        warn!("No item '{plc}' yet, creating it");
        project.root_mut().create_child(plc, ItemKind::Folder)?;
    }
    let Some(root) = project.item_mut(plc) else {
        bail!("no item '{plc}' in {}", project_path.display());
    };

    hil::update(&mut connector, root)?;

    connector.save()?;
    project.save_all()?;
    project.close();

    let programs = connector.hil_programs();
    if programs.is_empty() {
        print::print_status("No Profinet or EtherCAT devices in the project");
    }
    for program in programs {
        print::print_status(format!("{}/{}", hil::FOLDER_NAME, program.color(colors::ACCENT)));
    }
    Ok(())
}
