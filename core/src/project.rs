//! A host project session backed by a single XML file.
//!
//! ```xml
//! <Project Name="demo">
//!   <Item Name="IO" Kind="Folder">
//!     <Item Name="IO1" Kind="Device">
//!       <Comment>hw.hwml</Comment>
//!       <Content><TreeItem>...</TreeItem></Content>
//!     </Item>
//!   </Item>
//! </Project>
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use busforge_common::events::{SessionEvent, SessionEvents};
use busforge_common::project::{
    IoDevice, ItemKind, ProjectError, ProjectSession, TreeItem,
};
use tracing::{debug, info, warn};

use crate::descriptor::{self, DeviceDescriptor};
use crate::xml::{Document, Element};

/// Folder imported IO devices live in.
pub const IO_FOLDER: &str = "IO";

const PROJECT: &str = "Project";
const ITEM: &str = "Item";
const COMMENT: &str = "Comment";
const CONTENT: &str = "Content";
const NAME_ATTR: &str = "Name";
const KIND_ATTR: &str = "Kind";

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectItem {
    name: String,
    kind: ItemKind,
    comment: Option<String>,
    content: Option<Element>,
    children: Vec<ProjectItem>,
}

impl ProjectItem {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            comment: None,
            content: None,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[ProjectItem] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&ProjectItem> {
        self.children.iter().find(|child| child.name == name)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut ProjectItem> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    fn child_or_insert(&mut self, name: &str, kind: ItemKind) -> &mut ProjectItem {
        let index = match self.children.iter().position(|child| child.name == name) {
            Some(index) => index,
            None => {
                self.children.push(Self::new(name, kind));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn from_element(element: &Element) -> Result<Self, ProjectError> {
        let name = element
            .attribute(NAME_ATTR)
            .ok_or_else(|| ProjectError::InvalidProject("item without a name".into()))?;
        let kind = element
            .attribute(KIND_ATTR)
            .ok_or_else(|| ProjectError::InvalidProject(format!("item '{name}' has no kind")))?
            .parse()?;

        let mut item = Self::new(name, kind);
        for child in element.elements() {
            if child.is(COMMENT) {
                item.comment = Some(child.text());
            } else if child.is(CONTENT) {
                item.content = child.elements().next().cloned();
            } else if child.is(ITEM) {
                item.children.push(Self::from_element(child)?);
            }
        }
        Ok(item)
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(ITEM)
            .with_attribute(NAME_ATTR, &self.name)
            .with_attribute(KIND_ATTR, self.kind.as_str());
        if let Some(comment) = &self.comment {
            element.push(Element::new(COMMENT).with_text(comment));
        }
        if let Some(content) = &self.content {
            element.push(Element::new(CONTENT).with_child(content.clone()));
        }
        for child in &self.children {
            element.push(child.to_element());
        }
        element
    }
}

impl TreeItem for ProjectItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ItemKind {
        self.kind
    }

    fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    fn set_comment(&mut self, comment: &str) {
        self.comment = Some(comment.to_string());
    }

    fn produce_xml(&self) -> Result<String, ProjectError> {
        let xml = match &self.content {
            Some(content) => content.to_xml(),
            None => Element::new(self.kind.as_str())
                .with_attribute(NAME_ATTR, &self.name)
                .to_xml(),
        };
        xml.map_err(|e| ProjectError::InvalidXml(e.to_string()))
    }

    fn consume_xml(&mut self, xml: &str) -> Result<(), ProjectError> {
        let document = Document::parse(xml).map_err(|e| ProjectError::InvalidXml(e.to_string()))?;
        self.content = Some(document.into_root());
        Ok(())
    }

    fn child_names(&self) -> Vec<String> {
        self.children.iter().map(|child| child.name.clone()).collect()
    }

    fn lookup_child(&mut self, name: &str) -> Option<&mut dyn TreeItem> {
        self.child_mut(name).map(|child| child as &mut dyn TreeItem)
    }

    fn create_child(
        &mut self,
        name: &str,
        kind: ItemKind,
    ) -> Result<&mut dyn TreeItem, ProjectError> {
        if self.child(name).is_some() {
            return Err(ProjectError::DuplicateItem(name.to_string()));
        }
        self.children.push(Self::new(name, kind));
        let index = self.children.len() - 1;
        Ok(&mut self.children[index])
    }

    fn delete_child(&mut self, name: &str) -> Result<(), ProjectError> {
        self.children.retain(|child| child.name != name);
        Ok(())
    }
}

pub struct XmlProject {
    path: PathBuf,
    root: ProjectItem,
    events: Arc<SessionEvents>,
}

impl XmlProject {
    /// Creates an empty project with an `IO` folder and writes it to `path`.
    pub fn create(
        path: impl Into<PathBuf>,
        name: &str,
        events: Arc<SessionEvents>,
    ) -> Result<Self, ProjectError> {
        let mut root = ProjectItem::new(name, ItemKind::Folder);
        root.children.push(ProjectItem::new(IO_FOLDER, ItemKind::Folder));

        let mut project = Self {
            path: path.into(),
            root,
            events,
        };
        project.save_all()?;
        project.events.emit(SessionEvent::Opened(project.path.clone()));
        Ok(project)
    }

    pub fn open(path: impl Into<PathBuf>, events: Arc<SessionEvents>) -> Result<Self, ProjectError> {
        let path = path.into();
        let xml = fs::read_to_string(&path).map_err(|e| ProjectError::io(&path, e))?;
        let document =
            Document::parse(&xml).map_err(|e| ProjectError::InvalidProject(e.to_string()))?;

        let element = document.root();
        if !element.is(PROJECT) {
            return Err(ProjectError::InvalidProject(format!(
                "expected <{PROJECT}>, found <{}>",
                element.name()
            )));
        }
        let name = element.attribute(NAME_ATTR).unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut root = ProjectItem::new(name, ItemKind::Folder);
        for child in element.elements().filter(|child| child.is(ITEM)) {
            root.children.push(ProjectItem::from_element(child)?);
        }

        info!("Opened project {}", path.display());
        events.emit(SessionEvent::Opened(path.clone()));
        Ok(Self { path, root, events })
    }

    pub fn close(self) {
        debug!("Closing project {}", self.path.display());
        self.events.emit(SessionEvent::Closed);
    }

    pub fn name(&self) -> &str {
        &self.root.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the project file.
    pub fn folder(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn root(&self) -> &ProjectItem {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ProjectItem {
        &mut self.root
    }

    /// Resolves a `/`-separated item path below the project root.
    pub fn item_mut(&mut self, path: &str) -> Option<&mut dyn TreeItem> {
        let mut current = &mut self.root;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Every device of the `IO` folder whose bus class is known.
    pub fn io_devices(&self) -> Vec<IoDevice> {
        let Some(folder) = self.root.child(IO_FOLDER) else {
            return Vec::new();
        };

        folder
            .children
            .iter()
            .filter(|item| item.kind == ItemKind::Device)
            .filter_map(|item| {
                let xml = item.produce_xml().ok()?;
                let bus = match DeviceDescriptor::parse(&xml) {
                    Ok(descriptor) => descriptor.bus_class(),
                    Err(e) => {
                        debug!("Skipping '{}': {e}", item.name);
                        None
                    }
                }?;
                Some(IoDevice {
                    name: item.name.clone(),
                    bus,
                    xml,
                })
            })
            .collect()
    }
}

impl ProjectSession for XmlProject {
    fn save_all(&mut self) -> Result<(), ProjectError> {
        let mut element = Element::new(PROJECT).with_attribute(NAME_ATTR, &self.root.name);
        for child in &self.root.children {
            element.push(child.to_element());
        }
        let xml = Document::new(element)
            .to_xml()
            .map_err(|e| ProjectError::InvalidXml(e.to_string()))?;

        fs::write(&self.path, xml).map_err(|e| ProjectError::io(&self.path, e))?;
        debug!("Saved {}", self.path.display());
        Ok(())
    }

    fn update_io_device(
        &mut self,
        name: &str,
        descriptor: &Path,
    ) -> Result<Option<&mut dyn TreeItem>, ProjectError> {
        let xml = fs::read_to_string(descriptor).map_err(|e| ProjectError::io(descriptor, e))?;
        let document = Document::parse(&xml).map_err(|e| ProjectError::InvalidXml(e.to_string()))?;
        if !descriptor::is_device_descriptor(&document) {
            warn!("{} describes no device", descriptor.display());
            return Ok(None);
        }

        let device = self
            .root
            .child_or_insert(IO_FOLDER, ItemKind::Folder)
            .child_or_insert(name, ItemKind::Device);
        device.content = Some(document.into_root());

        info!("Device '{name}' updated");
        Ok(Some(device))
    }
}
