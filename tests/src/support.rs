use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use busforge_common::config::Config;
use busforge_common::events::SessionEvents;
use busforge_common::network::adapter::NetworkAdapter;
use busforge_common::project::SharedSession;
use busforge_core::capture::CaptureControl;
use busforge_core::project::XmlProject;
use busforge_core::scanner::{ScanJob, ScannerTool};
use pnet::util::MacAddr;
use tempfile::TempDir;

pub const PROFINET_DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<TreeItem>
  <ItemName>IO1</ItemName>
  <DeviceDef DevType="115">
    <AddressInfo>
      <Pnp>
        <DeviceDesc>unknown</DeviceDesc>
        <DeviceName>\DEVICE\{00000000}</DeviceName>
        <DeviceData>000000000000</DeviceData>
      </Pnp>
    </AddressInfo>
    <Settings Cycle="4000"/>
    <Box>
      <Name>im155-6pn</Name>
      <VendorId>0</VendorId>
      <DeviceId>0</DeviceId>
      <Module>
        <Name>DI 8x24VDC</Name>
        <Input><Name>DI_0</Name><Type>BOOL</Type></Input>
        <Input><Name>DI_1</Name><Type>BOOL</Type></Input>
      </Module>
      <Module>
        <Name>DQ 8x24VDC</Name>
        <Output><Name>DQ_0</Name><Type>BOOL</Type></Output>
      </Module>
    </Box>
  </DeviceDef>
</TreeItem>
"#;

pub const ETHERCAT_DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<TreeItem>
  <DeviceDef DevType="111">
    <AddressInfo><Pnp><DeviceDesc/><DeviceName/><DeviceData/></Pnp></AddressInfo>
    <Box>
      <Name>EK1100</Name>
      <Box>
        <Name>EL1004</Name>
        <Input><Name>Input 1</Name><Type>BIT</Type></Input>
      </Box>
      <Box>
        <Name>EL3102</Name>
        <Input><Name>Value</Name><Type>INT</Type></Input>
      </Box>
    </Box>
  </DeviceDef>
</TreeItem>
"#;

pub const REFERENCE_HARDWARE: &str = r#"<HardwareList>
  <Device Name="IM155-6PN">
    <VendorId>42</VendorId>
    <DeviceId>788</DeviceId>
  </Device>
</HardwareList>
"#;

pub fn adapter_a() -> NetworkAdapter {
    NetworkAdapter::new(
        "{5A1D0C3E-17B2-4F0E-9C47-0A1B2C3D4E5F}",
        "Ethernet 2",
        "Intel(R) Ethernet Controller I210",
        Some(MacAddr(0x00, 0x1b, 0x21, 0xaa, 0xbb, 0xcc)),
    )
}

/// A scanner that writes a fixed descriptor and exits with a fixed code.
pub struct FakeScanner {
    descriptor: Option<String>,
    exit_code: i32,
    pub launches: AtomicUsize,
    pub last_adapter: Mutex<Option<String>>,
}

impl FakeScanner {
    pub fn writing(descriptor: &str) -> Self {
        Self {
            descriptor: Some(descriptor.to_string()),
            exit_code: 0,
            launches: AtomicUsize::new(0),
            last_adapter: Mutex::new(None),
        }
    }

    pub fn silent() -> Self {
        Self {
            descriptor: None,
            ..Self::writing("")
        }
    }

    pub fn exiting_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl ScannerTool for FakeScanner {
    fn name(&self) -> String {
        "fake-scanner".into()
    }

    fn run(&self, job: &ScanJob<'_>) -> io::Result<Option<i32>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        *self.last_adapter.lock().unwrap() = Some(job.adapter_id.to_string());
        if let Some(descriptor) = &self.descriptor {
            fs::write(job.output, descriptor)?;
        }
        Ok(Some(self.exit_code))
    }
}

/// A scanner that blocks until released, to hold a capture cycle open.
pub struct GatedScanner {
    inner: FakeScanner,
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GatedScanner {
    /// Returns the scanner, a receiver signalled on launch and a sender releasing it.
    pub fn new(inner: FakeScanner) -> (Self, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let scanner = Self {
            inner,
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        (scanner, started_rx, release_tx)
    }

    pub fn launches(&self) -> usize {
        self.inner.launches()
    }
}

impl ScannerTool for GatedScanner {
    fn name(&self) -> String {
        "gated-scanner".into()
    }

    fn run(&self, job: &ScanJob<'_>) -> io::Result<Option<i32>> {
        let _ = self.started.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        self.inner.run(job)
    }
}

/// A project in a temporary directory plus a capture control wired to it.
pub struct Workspace {
    pub dir: TempDir,
    pub project: Arc<Mutex<XmlProject>>,
    pub control: CaptureControl,
}

impl Workspace {
    pub fn new(scanner: Arc<dyn ScannerTool>, adapters: Vec<NetworkAdapter>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = XmlProject::create(
            dir.path().join("plant.bfproj"),
            "plant",
            Arc::new(SessionEvents::new()),
        )
        .unwrap();
        let project = Arc::new(Mutex::new(project));
        let session: SharedSession = project.clone();

        let control = CaptureControl::new(
            scanner,
            Arc::new(adapters),
            session,
            dir.path(),
            &Config::default(),
        );

        Self {
            dir,
            project,
            control,
        }
    }

    pub fn artifact(&self, device: &str) -> PathBuf {
        self.dir.path().join(format!("{device}.xti"))
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn project_path(&self) -> PathBuf {
        self.dir.path().join("plant.bfproj")
    }
}
