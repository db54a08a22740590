//! Minimal owned DOM for rendered fragments
//!
//! Nodes are shared handles with parent back-links, so a binding can keep a
//! text node or an attribute and rewrite it in place after the fragment has
//! been handed to the caller. Markup is parsed with html5ever and converted
//! from its reference-counted tree.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html_escape::{encode_double_quoted_attribute, encode_text};
use markup5ever::{Attribute, QualName};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Result, StacheError};

/// Elements serialized without an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Node kind, as seen by the binding walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Fragment,
    Element,
    Text,
    Comment,
}

enum NodeData {
    Fragment,
    Element { name: String, attrs: RefCell<Vec<Attr>> },
    Text(RefCell<String>),
    Comment(String),
}

struct NodeInner {
    data: NodeData,
    parent: RefCell<Weak<NodeInner>>,
    children: RefCell<Vec<Node>>,
}

/// Shared handle to a DOM node
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

struct AttrInner {
    name: String,
    value: RefCell<String>,
}

/// Shared handle to an element attribute
#[derive(Clone)]
pub struct Attr(Rc<AttrInner>);

impl Attr {
    fn new(name: &str, value: &str) -> Self {
        Attr(Rc::new(AttrInner {
            name: name.to_string(),
            value: RefCell::new(value.to_string()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn value(&self) -> String {
        self.0.value.borrow().clone()
    }

    pub fn set_value(&self, value: &str) {
        *self.0.value.borrow_mut() = value.to_string();
    }

    pub fn ptr_eq(&self, other: &Attr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.name(), self.value())
    }
}

impl Node {
    fn new(data: NodeData) -> Self {
        Node(Rc::new(NodeInner {
            data,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        }))
    }

    pub fn fragment() -> Self {
        Self::new(NodeData::Fragment)
    }

    pub fn element(name: &str) -> Self {
        Self::new(NodeData::Element {
            name: name.to_ascii_lowercase(),
            attrs: RefCell::new(Vec::new()),
        })
    }

    pub fn text(text: &str) -> Self {
        Self::new(NodeData::Text(RefCell::new(text.to_string())))
    }

    pub fn comment(text: &str) -> Self {
        Self::new(NodeData::Comment(text.to_string()))
    }

    /// Parse markup into a fragment holding its top-level nodes
    pub fn parse_fragment(markup: &str) -> Result<Self> {
        let dom = parse_html(&format!("<template>{markup}</template>"))?;
        let mut found = Vec::new();
        collect_templates(&dom.document, &mut found);
        match found.first() {
            Some(template) => Ok(template_fragment(template)),
            None => Err(StacheError::HtmlParse {
                details: "fragment markup could not be parsed".to_string(),
            }),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.0.data {
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        }
    }

    /// Lowercase tag name for elements
    pub fn tag_name(&self) -> Option<&str> {
        match &self.0.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    /// Snapshot of the child list
    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    pub fn first_element_child(&self) -> Option<Node> {
        self.0
            .children
            .borrow()
            .iter()
            .find(|child| child.kind() == NodeKind::Element)
            .cloned()
    }

    fn index_of(&self, child: &Node) -> Option<usize> {
        self.0
            .children
            .borrow()
            .iter()
            .position(|candidate| candidate.ptr_eq(child))
    }

    fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    pub fn append_child(&self, child: &Node) {
        child.detach();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
    }

    /// Insert `child` right before `reference`; appends when `reference`
    /// is not a child of this node
    pub fn insert_before(&self, child: &Node, reference: &Node) {
        child.detach();
        let Some(index) = self.index_of(reference) else {
            self.append_child(child);
            return;
        };
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().insert(index, child.clone());
    }

    /// Remove a direct child; returns false when it is not one
    pub fn remove_child(&self, child: &Node) -> bool {
        let Some(index) = self.index_of(child) else {
            return false;
        };
        self.0.children.borrow_mut().remove(index);
        *child.0.parent.borrow_mut() = Weak::new();
        true
    }

    /// Text of this node and all text descendants, in document order
    pub fn text_content(&self) -> String {
        match &self.0.data {
            NodeData::Text(text) => text.borrow().clone(),
            NodeData::Comment(text) => text.clone(),
            NodeData::Fragment | NodeData::Element { .. } => {
                let mut out = String::new();
                self.collect_text(&mut out);
                out
            }
        }
    }

    fn collect_text(&self, out: &mut String) {
        for child in self.0.children.borrow().iter() {
            match &child.0.data {
                NodeData::Text(text) => out.push_str(&text.borrow()),
                NodeData::Element { .. } => child.collect_text(out),
                _ => {}
            }
        }
    }

    /// Replace the data of a text node (no-op on other kinds)
    pub fn set_text(&self, value: &str) {
        if let NodeData::Text(text) = &self.0.data {
            *text.borrow_mut() = value.to_string();
        }
    }

    /// Attribute handles of an element, in source order
    pub fn attributes(&self) -> Vec<Attr> {
        match &self.0.data {
            NodeData::Element { attrs, .. } => attrs.borrow().clone(),
            _ => Vec::new(),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|attr| attr.name() == name)
            .map(|attr| attr.value())
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let NodeData::Element { attrs, .. } = &self.0.data else {
            return;
        };
        let existing = attrs.borrow().iter().find(|attr| attr.name() == name).cloned();
        match existing {
            Some(attr) => attr.set_value(value),
            None => attrs.borrow_mut().push(Attr::new(name, value)),
        }
    }

    /// Whitespace-separated tokens of the `class` attribute
    pub fn class_list(&self) -> Vec<String> {
        self.get_attribute("class")
            .map(|classes| classes.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Copy this node and its whole subtree
    pub fn deep_clone(&self) -> Node {
        let copy = match &self.0.data {
            NodeData::Fragment => Node::fragment(),
            NodeData::Element { name, attrs } => {
                let element = Node::element(name);
                for attr in attrs.borrow().iter() {
                    element.set_attribute(attr.name(), &attr.value());
                }
                element
            }
            NodeData::Text(text) => Node::text(&text.borrow()),
            NodeData::Comment(text) => Node::comment(text),
        };
        for child in self.0.children.borrow().iter() {
            copy.append_child(&child.deep_clone());
        }
        copy
    }

    /// Serialize as HTML; fragments serialize their children only
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.0.data {
            NodeData::Fragment => self.write_children(out),
            NodeData::Text(text) => out.push_str(&encode_text(text.borrow().as_str())),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for attr in attrs.borrow().iter() {
                    out.push(' ');
                    out.push_str(attr.name());
                    out.push_str("=\"");
                    out.push_str(&encode_double_quoted_attribute(&attr.value()));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                self.write_children(out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }

    fn write_children(&self, out: &mut String) {
        for child in self.0.children.borrow().iter() {
            child.write_html(out);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind(), self.to_html())
    }
}

// ─────────────────────────────────────────────────────────────
// html5ever conversion
// ─────────────────────────────────────────────────────────────

/// Parse a full HTML document
pub(crate) fn parse_html(html: &str) -> Result<RcDom> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| StacheError::HtmlParse {
            details: e.to_string(),
        })
}

/// Collect `<template>` elements in document order
///
/// Does not look inside template contents, like a document-level query.
pub(crate) fn collect_templates(handle: &Handle, found: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        if let RcNodeData::Element { name, .. } = &child.data {
            if local(name) == "template" {
                found.push(child.clone());
                continue;
            }
        }
        collect_templates(child, found);
    }
}

/// Attribute value of a parsed element
pub(crate) fn rc_attribute(handle: &Handle, attribute: &str) -> Option<String> {
    match &handle.data {
        RcNodeData::Element { attrs, .. } => {
            find_attribute(&attrs.borrow(), attribute).map(|attr| attr.value.to_string())
        }
        _ => None,
    }
}

fn local(name: &QualName) -> &str {
    name.local.as_ref()
}

fn find_attribute<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| local(&attr.name) == name)
}

/// Content fragment of a parsed `<template>` element
pub(crate) fn template_fragment(template: &Handle) -> Node {
    let fragment = Node::fragment();
    if let RcNodeData::Element {
        template_contents, ..
    } = &template.data
    {
        if let Some(contents) = template_contents.borrow().as_ref() {
            append_converted(&fragment, contents);
        }
    }
    fragment
}

fn append_converted(parent: &Node, handle: &Handle) {
    for child in handle.children.borrow().iter() {
        if let Some(node) = convert(child) {
            parent.append_child(&node);
        }
    }
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        RcNodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let element = Node::element(local(name));
            for attr in attrs.borrow().iter() {
                element.set_attribute(local(&attr.name), &attr.value);
            }
            match template_contents.borrow().as_ref() {
                Some(contents) => append_converted(&element, contents),
                None => append_converted(&element, handle),
            }
            Some(element)
        }
        RcNodeData::Text { contents } => Some(Node::text(&contents.borrow())),
        RcNodeData::Comment { contents } => Some(Node::comment(contents)),
        _ => None,
    }
}
