//! A lossless XML element tree built from `quick-xml` events.
//!
//! Descriptors and project nodes are edited by reading the whole document,
//! changing a handful of elements and writing it back. Everything the edit does
//! not touch (attributes, comments, whitespace, entity references) is kept as
//! the raw bytes it was read from, so a write reproduces it unchanged.

use std::string::FromUtf8Error;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesCData, BytesDecl, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml syntax error at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("xml write error: {0}")]
    Write(#[from] quick_xml::Error),
    #[error("xml write error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("document is not valid utf-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Escaped character data exactly as read.
    Text(BytesText<'static>),
    CData(BytesCData<'static>),
    Comment(BytesText<'static>),
    Decl(BytesDecl<'static>),
    PI(BytesPI<'static>),
    DocType(BytesText<'static>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    start: BytesStart<'static>,
    children: Vec<Node>,
    /// Written as `<name/>` while it has no children.
    empty: bool,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_owned()),
            children: Vec::new(),
            empty: true,
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.start.push_attribute((key, value));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_cdata(mut self, text: &str) -> Self {
        self.children
            .push(Node::CData(BytesCData::new(text).into_owned()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.start.name().as_ref()).into_owned()
    }

    pub fn is(&self, name: &str) -> bool {
        self.start.name().as_ref() == name.as_bytes()
    }

    pub fn attribute(&self, key: &str) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|attribute| attribute.key.as_ref() == key.as_bytes())
            .map(|attribute| {
                let raw = String::from_utf8_lossy(&attribute.value).into_owned();
                match unescape(&raw) {
                    Ok(value) => value.into_owned(),
                    Err(_) => raw.clone(),
                }
            })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|element| element.is(name))
    }

    /// Follows a chain of child element names.
    pub fn path(&self, path: &[&str]) -> Option<&Element> {
        let mut current = self;
        for name in path {
            current = current.child(name)?;
        }
        Some(current)
    }

    pub fn path_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for name in path {
            current = current.child_mut(name)?;
        }
        Some(current)
    }

    /// Removes every child element called `name`, returning how many were removed.
    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|node| match node {
            Node::Element(element) => !element.is(name),
            _ => true,
        });
        before - self.children.len()
    }

    /// Depth-first search for the first descendant matching `pred`.
    /// Descendants of elements matching `prune` are not searched.
    pub fn find<P, S>(&self, pred: &P, prune: &S) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
        S: Fn(&Element) -> bool,
    {
        for element in self.elements() {
            if pred(element) {
                return Some(element);
            }
            if prune(element) {
                continue;
            }
            if let Some(found) = element.find(pred, prune) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_mut<P, S>(&mut self, pred: &P, prune: &S) -> Option<&mut Element>
    where
        P: Fn(&Element) -> bool,
        S: Fn(&Element) -> bool,
    {
        let index = self.children.iter().position(|node| match node {
            Node::Element(element) => {
                pred(element) || (!prune(element) && element.find(pred, prune).is_some())
            }
            _ => false,
        })?;

        let direct = matches!(&self.children[index], Node::Element(element) if pred(element));
        match &mut self.children[index] {
            Node::Element(element) => {
                if direct {
                    Some(element)
                } else {
                    element.find_mut(pred, prune)
                }
            }
            _ => None,
        }
    }

    /// Collects every descendant matching `pred`, without descending into matches.
    pub fn collect<'a, P>(&'a self, pred: &P, out: &mut Vec<&'a Element>)
    where
        P: Fn(&Element) -> bool,
    {
        for element in self.elements() {
            if pred(element) {
                out.push(element);
            } else {
                element.collect(pred, out);
            }
        }
    }

    /// Unescaped character data directly inside this element.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        for node in &self.children {
            match node {
                Node::Text(text) => raw.push_str(&String::from_utf8_lossy(text)),
                Node::CData(data) => raw.push_str(&escape(&*String::from_utf8_lossy(data))),
                _ => {}
            }
        }
        match unescape(&raw) {
            Ok(text) => text.into_owned(),
            Err(_) => raw.clone(),
        }
    }

    /// Replaces the character data of this element, keeping child elements.
    pub fn set_text(&mut self, text: &str) {
        let is_text = |node: &Node| matches!(node, Node::Text(_) | Node::CData(_));
        let position = self.children.iter().position(is_text);
        self.children.retain(|node| !is_text(node));

        let node = Node::Text(BytesText::new(text).into_owned());
        match position {
            Some(index) if index <= self.children.len() => self.children.insert(index, node),
            _ => self.children.push(node),
        }
        self.empty = false;
    }

    /// Sets the text of the child `name`, appending the child if it is missing.
    pub fn set_child_text(&mut self, name: &str, text: &str) {
        match self.child_mut(name) {
            Some(child) => child.set_text(text),
            None => self.push(Element::new(name).with_text(text)),
        }
    }

    /// Serializes this element alone, without an XML declaration.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    /// A new document with a UTF-8 declaration.
    pub fn new(root: Element) -> Self {
        Self {
            prolog: vec![Node::Decl(BytesDecl::new("1.0", Some("utf-8"), None))],
            root,
            epilog: Vec::new(),
        }
    }

    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let mut reader = Reader::from_str(xml);
        let mut builder = TreeBuilder::default();

        loop {
            let event = reader.read_event().map_err(|source| XmlError::Syntax {
                position: reader.error_position() as u64,
                source,
            })?;

            match event {
                Event::Start(start) => builder.open(start.into_owned()),
                Event::Empty(start) => builder.attach(Node::Element(Element {
                    start: start.into_owned(),
                    children: Vec::new(),
                    empty: true,
                }))?,
                Event::End(_) => builder.close()?,
                Event::Text(text) => builder.attach(Node::Text(text.into_owned()))?,
                Event::GeneralRef(reference) => {
                    let raw = format!("&{};", String::from_utf8_lossy(&reference));
                    builder.attach(Node::Text(BytesText::from_escaped(raw)))?
                }
                Event::CData(data) => builder.attach(Node::CData(data.into_owned()))?,
                Event::Comment(comment) => builder.attach(Node::Comment(comment.into_owned()))?,
                Event::Decl(decl) => builder.attach(Node::Decl(decl.into_owned()))?,
                Event::PI(pi) => builder.attach(Node::PI(pi.into_owned()))?,
                Event::DocType(doctype) => builder.attach(Node::DocType(doctype.into_owned()))?,
                Event::Eof => break,
            }
        }

        builder.finish()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

#[derive(Default)]
struct TreeBuilder {
    prolog: Vec<Node>,
    stack: Vec<Element>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn open(&mut self, start: BytesStart<'static>) {
        self.stack.push(Element {
            start,
            children: Vec::new(),
            empty: false,
        });
    }

    fn close(&mut self) -> Result<(), XmlError> {
        let element = self
            .stack
            .pop()
            .ok_or_else(|| XmlError::Malformed("closing tag without an open element".into()))?;
        self.attach(Node::Element(element))
    }

    fn attach(&mut self, node: Node) -> Result<(), XmlError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }

        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(XmlError::Malformed("more than one root element".into()));
                }
                self.root = Some(element);
            }
            Node::Text(ref text) if !is_blank(text) => {
                return Err(XmlError::Malformed("text outside the root element".into()));
            }
            other if self.root.is_some() => self.epilog.push(other),
            other => self.prolog.push(other),
        }
        Ok(())
    }

    fn finish(self) -> Result<Document, XmlError> {
        if let Some(open) = self.stack.last() {
            return Err(XmlError::Malformed(format!(
                "element <{}> is never closed",
                open.name()
            )));
        }
        let root = self
            .root
            .ok_or_else(|| XmlError::Malformed("document has no root element".into()))?;

        Ok(Document {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), XmlError> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(text) => writer.write_event(Event::Text(text.clone()))?,
        Node::CData(data) => writer.write_event(Event::CData(data.clone()))?,
        Node::Comment(comment) => writer.write_event(Event::Comment(comment.clone()))?,
        Node::Decl(decl) => writer.write_event(Event::Decl(decl.clone()))?,
        Node::PI(pi) => writer.write_event(Event::PI(pi.clone()))?,
        Node::DocType(doctype) => writer.write_event(Event::DocType(doctype.clone()))?,
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    if element.empty && element.children.is_empty() {
        writer.write_event(Event::Empty(element.start.clone()))?;
        return Ok(());
    }

    writer.write_event(Event::Start(element.start.clone()))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(element.start.to_end()))?;
    Ok(())
}
