use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow, bail};
use busforge_common::capture::ScanSettings;
use busforge_common::config::Config;
use busforge_common::events::{SessionEvent, SessionEventKind, SessionEvents};
use busforge_common::network::adapter::SystemAdapters;
use busforge_common::network::interface;
use busforge_common::project::{ProjectSession, SharedSession};
use busforge_core::capture::CaptureControl;
use busforge_core::importer::ImportOutcome;
use busforge_core::project::XmlProject;
use busforge_core::scanner::ExternalScanner;
use colored::*;
use tracing::{info, warn};

use crate::terminal::{colors, print, spinner};

pub async fn capture(
    name: String,
    adapter: &str,
    project_path: &Path,
    reference: Option<PathBuf>,
    cfg: &Config,
) -> anyhow::Result<()> {
    let events = Arc::new(SessionEvents::new());
    events.once(SessionEventKind::Opened, |event| {
        if let SessionEvent::Opened(path) = event {
            info!("Session opened on {}", path.display());
        }
    });

    let project = open_or_create(project_path, events)?;
    let folder = project.folder().to_path_buf();
    let project = Arc::new(Mutex::new(project));
    let session: SharedSession = project.clone();

    let candidates = interface::get_capture_adapters();
    let selected = interface::select_adapter(adapter, &candidates);
    if selected.is_none() {
        warn!("No capture adapter matches '{adapter}', see `busforge adapters`");
    }

    let mut settings = ScanSettings::new(name.clone(), selected);
    if let Some(reference) = reference {
        settings = settings.with_reference(reference);
    }

    let control = CaptureControl::new(
        Arc::new(ExternalScanner::new(&cfg.scanner_tool)),
        Arc::new(SystemAdapters),
        session,
        folder,
        cfg,
    );
    let handle = control.start_capture(settings)?;

    if cfg.quiet == 0 {
        spinner::start(&format!("Scanning for {name}"), cfg.scan_duration);
    }
    let outcome = tokio::task::spawn_blocking(move || handle.wait()).await?;
    spinner::stop();
    drop(control);

    let mut project = Arc::try_unwrap(project)
        .map_err(|_| anyhow!("project session is still in use"))?
        .into_inner()
        .map_err(|_| anyhow!("project session is unavailable"))?;
    project.save_all()?;
    project.close();

    match outcome {
        ImportOutcome::Imported { device } => {
            print::print_status(format!(
                "{} imported into {}",
                device.color(colors::ACCENT),
                project_path.display()
            ));
            Ok(())
        }
        ImportOutcome::NothingCreated => {
            print::print_status("Nothing was imported");
            Ok(())
        }
        ImportOutcome::Failed => bail!("capture of '{name}' failed"),
    }
}

fn open_or_create(path: &Path, events: Arc<SessionEvents>) -> anyhow::Result<XmlProject> {
    if path.exists() {
        return XmlProject::open(path, events)
            .with_context(|| format!("cannot open {}", path.display()));
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    info!("Creating project {}", path.display());
    XmlProject::create(path, &name, events)
        .with_context(|| format!("cannot create {}", path.display()))
}
