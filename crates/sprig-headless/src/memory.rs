#![forbid(unsafe_code)]

//! In-memory node tree implementing [`Host`].
//!
//! Nodes live in an append-only arena addressed by [`NodeId`]. Detached
//! nodes are kept so that tests can still inspect what was removed.
//!
//! # Example
//!
//! ```
//! use sprig_core::Host;
//! use sprig_headless::MemoryHost;
//!
//! let mut host = MemoryHost::new();
//! let root = host.root();
//! let div = host.create_node("div").unwrap();
//! host.set_attribute(&div, "id", &"foo".into()).unwrap();
//! host.append_child(&root, &div).unwrap();
//! assert_eq!(host.inner_markup(root), r#"<div id="foo"></div>"#);
//! ```

use std::fmt::{self, Write as _};

use sprig_core::props::PropValue;
use sprig_core::{Event, EventHandler, Host, TEXT_VALUE_PROP};

/// Handle to a node in a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operation category, used to select operations for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOpKind {
    CreateNode,
    CreateTextNode,
    SetAttribute,
    RemoveAttribute,
    AddListener,
    RemoveListener,
    AppendChild,
    RemoveChild,
}

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateNode { node: NodeId, tag: String },
    CreateTextNode { node: NodeId, value: String },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    AddListener { node: NodeId, event_type: String },
    RemoveListener { node: NodeId, event_type: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
}

impl HostOp {
    /// Category of this operation.
    #[must_use]
    pub const fn kind(&self) -> HostOpKind {
        match self {
            Self::CreateNode { .. } => HostOpKind::CreateNode,
            Self::CreateTextNode { .. } => HostOpKind::CreateTextNode,
            Self::SetAttribute { .. } => HostOpKind::SetAttribute,
            Self::RemoveAttribute { .. } => HostOpKind::RemoveAttribute,
            Self::AddListener { .. } => HostOpKind::AddListener,
            Self::RemoveListener { .. } => HostOpKind::RemoveListener,
            Self::AppendChild { .. } => HostOpKind::AppendChild,
            Self::RemoveChild { .. } => HostOpKind::RemoveChild,
        }
    }

    /// Whether the operation changes the live tree shape or node content
    /// (everything except node creation).
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::CreateNode { .. } | Self::CreateTextNode { .. })
    }
}

/// Memory host error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryHostError {
    /// A failure requested with [`MemoryHost::fail_on`].
    Injected(HostOpKind),
    /// The handle does not belong to this host.
    UnknownNode(NodeId),
    /// `remove_child` on a node that is not a child of `parent`.
    NotAChild { parent: NodeId, child: NodeId },
    /// Text nodes cannot have children.
    TextParent(NodeId),
    /// Appending a node under itself or one of its descendants.
    Cycle { parent: NodeId, child: NodeId },
}

impl fmt::Display for MemoryHostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Injected(kind) => write!(f, "injected failure on {kind:?}"),
            Self::UnknownNode(node) => write!(f, "unknown node {node}"),
            Self::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of {parent}")
            }
            Self::TextParent(node) => write!(f, "text node {node} cannot have children"),
            Self::Cycle { parent, child } => {
                write!(f, "appending {child} under {parent} would create a cycle")
            }
        }
    }
}

impl std::error::Error for MemoryHostError {}

/// Memory host configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryHostConfig {
    /// Record every operation into the op log.
    pub record_ops: bool,
    /// Tag of the container node created with the host.
    pub root_tag: &'static str,
}

impl Default for MemoryHostConfig {
    fn default() -> Self {
        Self {
            record_ops: true,
            root_tag: "root",
        }
    }
}

impl MemoryHostConfig {
    /// Disable the op log (benchmarks).
    #[must_use]
    pub const fn without_op_log(mut self) -> Self {
        self.record_ops = false;
        self
    }
}

#[derive(Debug)]
enum NodeContent {
    Element(String),
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    content: NodeContent,
    attributes: Vec<(String, PropValue)>,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl NodeData {
    fn new(content: NodeContent) -> Self {
        Self {
            content,
            attributes: Vec::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// Deterministic in-memory host.
#[derive(Debug)]
pub struct MemoryHost {
    config: MemoryHostConfig,
    nodes: Vec<NodeData>,
    root: NodeId,
    ops: Vec<HostOp>,
    failures: Vec<HostOpKind>,
    calls: u64,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Host with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MemoryHostConfig::default())
    }

    /// Host with an explicit configuration.
    #[must_use]
    pub fn with_config(config: MemoryHostConfig) -> Self {
        let root = NodeData::new(NodeContent::Element(config.root_tag.to_owned()));
        Self {
            config,
            nodes: vec![root],
            root: NodeId(0),
            ops: Vec::new(),
            failures: Vec::new(),
            calls: 0,
        }
    }

    /// Container node created with the host. Not recorded in the op log.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    // ---- Op log ----

    /// Recorded operations since creation or the last [`take_ops`](Self::take_ops).
    #[must_use]
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain the op log.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Total host calls made, including failed ones and unrecorded ones.
    #[must_use]
    pub const fn call_count(&self) -> u64 {
        self.calls
    }

    // ---- Failure injection ----

    /// Make every subsequent operation of `kind` fail.
    pub fn fail_on(&mut self, kind: HostOpKind) {
        if !self.failures.contains(&kind) {
            self.failures.push(kind);
        }
    }

    /// Stop injecting failures.
    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    // ---- Inspection ----

    /// Nodes ever created, attached or not, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes currently reachable from the root, excluding the root.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.descendants(self.root).len()
    }

    /// Children of `node` in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map_or(&[][..], |n| n.children.as_slice())
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index()).and_then(|n| n.parent)
    }

    /// Tag of an element node.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.index())?.content {
            NodeContent::Element(tag) => Some(tag),
            NodeContent::Text(_) => None,
        }
    }

    /// Content of a text node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.index())?.content {
            NodeContent::Text(text) => Some(text),
            NodeContent::Element(_) => None,
        }
    }

    /// Attribute value.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&PropValue> {
        self.nodes
            .get(node.index())?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Number of listeners attached for `event_type`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.nodes.get(node.index()).map_or(0, |n| {
            n.listeners.iter().filter(|(t, _)| t == event_type).count()
        })
    }

    /// Whether `node` is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == self.root {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Descendants of `node` in document order.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Attached element nodes with `tag`, in document order.
    #[must_use]
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.tag(id) == Some(tag))
            .collect()
    }

    /// First attached node whose attribute `name` displays as `value`.
    #[must_use]
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(self.root).into_iter().find(|&id| {
            self.attribute(id, name)
                .is_some_and(|v| v.to_string() == value)
        })
    }

    /// Concatenated text content of `node` and its descendants.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(node) {
            out.push_str(text);
        }
        for id in self.descendants(node) {
            if let Some(text) = self.text(id) {
                out.push_str(text);
            }
        }
        out
    }

    /// Markup of `node` and its subtree.
    ///
    /// Attributes appear in the order they were first set. Listeners are not
    /// shown.
    #[must_use]
    pub fn markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    /// Markup of the children of `node`.
    #[must_use]
    pub fn inner_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_markup(child, &mut out);
        }
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(node.index()) else {
            return;
        };
        match &data.content {
            NodeContent::Text(text) => out.push_str(text),
            NodeContent::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &data.attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                for &child in &data.children {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    // ---- Events ----

    /// Deliver `event` to the listeners on `node` registered for its type.
    ///
    /// Listeners run synchronously in attachment order. Returns how many ran.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> usize {
        let handlers: Vec<EventHandler> = self
            .nodes
            .get(node.index())
            .map(|n| {
                n.listeners
                    .iter()
                    .filter(|(t, _)| t == event.event_type())
                    .map(|(_, h)| h.clone())
                    .collect()
            })
            .unwrap_or_default();
        for handler in &handlers {
            handler.call(event);
        }
        handlers.len()
    }

    // ---- Internals ----

    fn begin(&mut self, kind: HostOpKind) -> Result<(), MemoryHostError> {
        self.calls += 1;
        if self.failures.contains(&kind) {
            return Err(MemoryHostError::Injected(kind));
        }
        Ok(())
    }

    fn record(&mut self, op: HostOp) {
        if self.config.record_ops {
            self.ops.push(op);
        }
    }

    fn check(&self, node: NodeId) -> Result<(), MemoryHostError> {
        if node.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(MemoryHostError::UnknownNode(node))
        }
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeData, MemoryHostError> {
        self.nodes
            .get_mut(node.index())
            .ok_or(MemoryHostError::UnknownNode(node))
    }

    fn push_node(&mut self, content: NodeContent) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeData::new(content));
        id
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.parent(child) {
            if let Some(data) = self.nodes.get_mut(old_parent.index()) {
                data.children.retain(|&c| c != child);
            }
            if let Some(data) = self.nodes.get_mut(child.index()) {
                data.parent = None;
            }
        }
    }
}

impl Host for MemoryHost {
    type Node = NodeId;
    type Error = MemoryHostError;

    fn create_node(&mut self, tag: &str) -> Result<NodeId, MemoryHostError> {
        self.begin(HostOpKind::CreateNode)?;
        let node = self.push_node(NodeContent::Element(tag.to_owned()));
        self.record(HostOp::CreateNode {
            node,
            tag: tag.to_owned(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self, value: &PropValue) -> Result<NodeId, MemoryHostError> {
        self.begin(HostOpKind::CreateTextNode)?;
        let text = value.to_string();
        let node = self.push_node(NodeContent::Text(text.clone()));
        self.record(HostOp::CreateTextNode { node, value: text });
        Ok(node)
    }

    fn set_attribute(
        &mut self,
        node: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), MemoryHostError> {
        self.begin(HostOpKind::SetAttribute)?;
        let data = self.node_mut(*node)?;
        match &mut data.content {
            // A text node's content is its `nodeValue`.
            NodeContent::Text(text) if name == TEXT_VALUE_PROP => *text = value.to_string(),
            _ => match data.attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, slot)) => *slot = value.clone(),
                None => data.attributes.push((name.to_owned(), value.clone())),
            },
        }
        self.record(HostOp::SetAttribute {
            node: *node,
            name: name.to_owned(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), MemoryHostError> {
        self.begin(HostOpKind::RemoveAttribute)?;
        let data = self.node_mut(*node)?;
        match &mut data.content {
            NodeContent::Text(text) if name == TEXT_VALUE_PROP => text.clear(),
            _ => data.attributes.retain(|(n, _)| n != name),
        }
        self.record(HostOp::RemoveAttribute {
            node: *node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: &NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), MemoryHostError> {
        self.begin(HostOpKind::AddListener)?;
        self.node_mut(*node)?
            .listeners
            .push((event_type.to_owned(), handler.clone()));
        self.record(HostOp::AddListener {
            node: *node,
            event_type: event_type.to_owned(),
        });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<(), MemoryHostError> {
        self.begin(HostOpKind::RemoveListener)?;
        let data = self.node_mut(*node)?;
        // Unknown listeners are ignored, as a DOM would.
        if let Some(pos) = data
            .listeners
            .iter()
            .position(|(t, h)| t == event_type && h.ptr_eq(handler))
        {
            data.listeners.remove(pos);
        }
        self.record(HostOp::RemoveListener {
            node: *node,
            event_type: event_type.to_owned(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryHostError> {
        self.begin(HostOpKind::AppendChild)?;
        self.check(*parent)?;
        self.check(*child)?;
        if self.text(*parent).is_some() {
            return Err(MemoryHostError::TextParent(*parent));
        }
        let mut cursor = Some(*parent);
        while let Some(id) = cursor {
            if id == *child {
                return Err(MemoryHostError::Cycle {
                    parent: *parent,
                    child: *child,
                });
            }
            cursor = self.parent(id);
        }
        self.detach(*child);
        self.node_mut(*parent)?.children.push(*child);
        self.node_mut(*child)?.parent = Some(*parent);
        self.record(HostOp::AppendChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryHostError> {
        self.begin(HostOpKind::RemoveChild)?;
        self.check(*parent)?;
        self.check(*child)?;
        if self.parent(*child) != Some(*parent) {
            return Err(MemoryHostError::NotAChild {
                parent: *parent,
                child: *child,
            });
        }
        self.detach(*child);
        self.record(HostOp::RemoveChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }
}
