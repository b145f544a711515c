#![forbid(unsafe_code)]

//! Deterministic in-memory document.
//!
//! A small node arena implementing [`DocumentHost`]. Layout is a simple block
//! model: a node's content box is its explicit `width`/`height` style, else
//! its intrinsic size, else its visible children stacked vertically (widest
//! child, summed heights of their full boxes).
//!
//! Like a real engine, anything under `display: none` or outside the
//! document measures as zero. Descendant rules keyed by an ancestor class
//! model stylesheets whose effect depends on where content is mounted.

use core::fmt;
use std::collections::BTreeMap;

use ahash::AHashMap;
use fmodal_backend::{BoxExtents, DocumentHost, ListenerHandle, ListenerTarget, StyleValue};
use fmodal_core::event::ListenerKind;
use fmodal_core::geometry::{Sides, Size};
use fmodal_core::node::NodeId;

/// Document error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebDocumentError {
    /// The node was never created or has been destroyed.
    UnknownNode(NodeId),
    /// The listener handle is not registered.
    UnknownListener(ListenerHandle),
    /// The operation would put a node inside its own subtree.
    Hierarchy { parent: NodeId, child: NodeId },
    /// `reference` is not a child of `parent`.
    NotAChild { parent: NodeId, reference: NodeId },
    /// The document root cannot be moved or released.
    RootMutation,
}

impl fmt::Display for WebDocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node {id}"),
            Self::UnknownListener(handle) => write!(f, "unknown listener {}", handle.get()),
            Self::Hierarchy { parent, child } => {
                write!(f, "cannot insert {child} under its own descendant {parent}")
            }
            Self::NotAChild { parent, reference } => {
                write!(f, "{reference} is not a child of {parent}")
            }
            Self::RootMutation => f.write_str("the document root cannot be moved or released"),
        }
    }
}

impl std::error::Error for WebDocumentError {}

/// Padding, border, and margin of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxModel {
    pub padding: Sides,
    pub border: Sides,
    pub margin: Sides,
}

impl BoxModel {
    /// Component-wise sum.
    #[must_use]
    pub fn plus(self, other: BoxModel) -> BoxModel {
        let add = |a: Sides, b: Sides| {
            Sides::new(a.top + b.top, a.right + b.right, a.bottom + b.bottom, a.left + b.left)
        };
        BoxModel {
            padding: add(self.padding, other.padding),
            border: add(self.border, other.border),
            margin: add(self.margin, other.margin),
        }
    }

    fn outset(&self, content: Size, extents: BoxExtents) -> Size {
        let mut size = content;
        if extents.contains(BoxExtents::PADDING) {
            size = size.outset(self.padding);
        }
        if extents.contains(BoxExtents::BORDER) {
            size = size.outset(self.border);
        }
        if extents.contains(BoxExtents::MARGIN) {
            size = size.outset(self.margin);
        }
        size
    }
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    styles: AHashMap<String, StyleValue>,
    attributes: AHashMap<String, String>,
    intrinsic: Option<Size>,
    box_model: BoxModel,
}

/// In-memory document rooted at a `body` element.
#[derive(Debug, Clone)]
pub struct WebDocument {
    nodes: AHashMap<NodeId, NodeData>,
    root: NodeId,
    next_node: u32,
    listeners: BTreeMap<ListenerHandle, (ListenerTarget, ListenerKind)>,
    next_listener: u64,
    descendant_rules: AHashMap<String, BoxModel>,
}

impl Default for WebDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl WebDocument {
    /// Create a document containing only its root.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId::new(0);
        let mut nodes = AHashMap::new();
        nodes.insert(
            root,
            NodeData {
                tag: "body".to_owned(),
                ..NodeData::default()
            },
        );
        Self {
            nodes,
            root,
            next_node: 1,
            listeners: BTreeMap::new(),
            next_listener: 1,
            descendant_rules: AHashMap::new(),
        }
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, WebDocumentError> {
        self.nodes.get(&id).ok_or(WebDocumentError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, WebDocumentError> {
        self.nodes
            .get_mut(&id)
            .ok_or(WebDocumentError::UnknownNode(id))
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, data);
        id
    }

    /// Create a detached block with a fixed intrinsic size.
    pub fn create_block(&mut self, size: Size) -> NodeId {
        self.alloc(NodeData {
            tag: "div".to_owned(),
            intrinsic: Some(size),
            ..NodeData::default()
        })
    }

    /// Create a detached `<img>` with a natural size.
    pub fn create_image(&mut self, src: &str, natural: Size) -> NodeId {
        let mut attributes = AHashMap::new();
        attributes.insert("src".to_owned(), src.to_owned());
        self.alloc(NodeData {
            tag: "img".to_owned(),
            attributes,
            intrinsic: Some(natural),
            ..NodeData::default()
        })
    }

    /// Override the intrinsic size of a node (text reflow, image decode).
    pub fn set_intrinsic_size(&mut self, node: NodeId, size: Size) -> Result<(), WebDocumentError> {
        self.node_mut(node)?.intrinsic = Some(size);
        Ok(())
    }

    pub fn set_box_model(&mut self, node: NodeId, model: BoxModel) -> Result<(), WebDocumentError> {
        self.node_mut(node)?.box_model = model;
        Ok(())
    }

    /// Register a rule: children of any element carrying `class` get `model`
    /// added to their own box model.
    pub fn add_descendant_rule(&mut self, class: &str, model: BoxModel) {
        self.descendant_rules.insert(class.to_owned(), model);
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|data| data.tag.as_str())
    }

    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<&StyleValue> {
        self.nodes.get(&node)?.styles.get(property)
    }

    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|data| data.classes.iter().any(|c| c == class))
    }

    #[must_use]
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// True if the node is attached (transitively) under the root.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.ancestors_inclusive(node).any(|id| id == self.root)
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of listeners registered for a target/kind pair.
    #[must_use]
    pub fn listener_count_for(&self, target: ListenerTarget, kind: ListenerKind) -> usize {
        self.listeners
            .values()
            .filter(|&&(t, k)| t == target && k == kind)
            .count()
    }

    fn ancestors_inclusive(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(
            self.nodes.contains_key(&node).then_some(node),
            move |id| self.nodes.get(id).and_then(|data| data.parent),
        )
    }

    fn is_displayed(&self, node: NodeId) -> bool {
        self.ancestors_inclusive(node).all(|id| {
            !matches!(
                self.nodes.get(&id).and_then(|d| d.styles.get("display")),
                Some(StyleValue::Keyword(k)) if k == "none"
            )
        })
    }

    fn effective_box_model(&self, data: &NodeData) -> BoxModel {
        let inherited = data
            .parent
            .and_then(|parent| self.nodes.get(&parent))
            .into_iter()
            .flat_map(|parent| parent.classes.iter())
            .filter_map(|class| self.descendant_rules.get(class))
            .fold(BoxModel::default(), |acc, rule| acc.plus(*rule));
        data.box_model.plus(inherited)
    }

    fn content_size(&self, data: &NodeData) -> Size {
        let px = |property: &str| match data.styles.get(property) {
            Some(StyleValue::Px(v)) => Some(*v),
            _ => None,
        };
        let stacked = || {
            data.children
                .iter()
                .filter(|child| self.is_displayed(**child))
                .filter_map(|child| self.outer_size(*child, BoxExtents::all()))
                .fold(Size::ZERO, |acc, child| {
                    Size::new(acc.width.max(child.width), acc.height + child.height)
                })
        };
        let natural = data.intrinsic.unwrap_or_else(stacked);
        Size::new(
            px("width").unwrap_or(natural.width),
            px("height").unwrap_or(natural.height),
        )
    }

    fn outer_size(&self, node: NodeId, extents: BoxExtents) -> Option<Size> {
        let data = self.nodes.get(&node)?;
        let content = self.content_size(data);
        Some(self.effective_box_model(data).outset(content, extents))
    }

    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    fn unlink(&mut self, node: NodeId) -> Result<(), WebDocumentError> {
        let parent = self.node(node)?.parent;
        if let Some(parent) = parent {
            if let Some(data) = self.nodes.get_mut(&parent) {
                data.children.retain(|child| *child != node);
            }
            self.node_mut(node)?.parent = None;
        }
        Ok(())
    }

    fn clone_subtree(&mut self, node: NodeId, deep: bool) -> Result<NodeId, WebDocumentError> {
        let source = self.node(node)?.clone();
        let copy = self.alloc(NodeData {
            parent: None,
            children: Vec::new(),
            ..source.clone()
        });
        if deep {
            for child in source.children {
                let child_copy = self.clone_subtree(child, true)?;
                self.node_mut(child_copy)?.parent = Some(copy);
                self.node_mut(copy)?.children.push(child_copy);
            }
        }
        Ok(copy)
    }
}

impl DocumentHost for WebDocument {
    type Error = WebDocumentError;

    fn root(&self) -> NodeId {
        self.root
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, Self::Error> {
        Ok(self.alloc(NodeData {
            tag: tag.to_owned(),
            ..NodeData::default()
        }))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Self::Error> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), Self::Error> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(WebDocumentError::RootMutation);
        }
        if self.ancestors_inclusive(parent).any(|id| id == child) {
            return Err(WebDocumentError::Hierarchy { parent, child });
        }
        if let Some(reference) = reference
            && self.node(reference)?.parent != Some(parent)
        {
            return Err(WebDocumentError::NotAChild { parent, reference });
        }
        self.unlink(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = reference
            .and_then(|r| siblings.iter().position(|id| *id == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), Self::Error> {
        if node == self.root {
            return Err(WebDocumentError::RootMutation);
        }
        self.unlink(node)
    }

    fn destroy(&mut self, node: NodeId) -> Result<(), Self::Error> {
        self.detach(node)?;
        for id in self.subtree(node) {
            self.nodes.remove(&id);
        }
        Ok(())
    }

    fn clear_children(&mut self, node: NodeId) -> Result<(), Self::Error> {
        let children = std::mem::take(&mut self.node_mut(node)?.children);
        for child in children {
            if let Some(data) = self.nodes.get_mut(&child) {
                data.parent = None;
            }
        }
        Ok(())
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, Self::Error> {
        self.clone_subtree(node, deep)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = &self.nodes.get(&parent)?.children;
        let index = siblings.iter().position(|id| *id == node)?;
        siblings.get(index + 1).copied()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_inclusive(node).any(|id| id == ancestor)
    }

    fn set_style(
        &mut self,
        node: NodeId,
        property: &str,
        value: StyleValue,
    ) -> Result<(), Self::Error> {
        self.node_mut(node)?.styles.insert(property.to_owned(), value);
        Ok(())
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), Self::Error> {
        let classes = &mut self.node_mut(node)?.classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_owned());
        }
        Ok(())
    }

    fn image_sources(&self, node: NodeId) -> Vec<String> {
        self.subtree(node)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .filter(|data| data.tag == "img")
            .filter_map(|data| data.attributes.get("src").cloned())
            .collect()
    }

    fn measure(&self, node: NodeId, extents: BoxExtents) -> Result<Size, Self::Error> {
        self.node(node)?;
        if !self.is_connected(node) || !self.is_displayed(node) {
            return Ok(Size::ZERO);
        }
        Ok(self.outer_size(node, extents).unwrap_or(Size::ZERO))
    }

    fn add_listener(
        &mut self,
        target: ListenerTarget,
        kind: ListenerKind,
    ) -> Result<ListenerHandle, Self::Error> {
        if let ListenerTarget::Node(node) = target {
            self.node(node)?;
        }
        let handle = ListenerHandle::new(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(handle, (target, kind));
        Ok(handle)
    }

    fn remove_listener(&mut self, handle: ListenerHandle) -> Result<(), Self::Error> {
        self.listeners
            .remove(&handle)
            .map(|_| ())
            .ok_or(WebDocumentError::UnknownListener(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached_block(doc: &mut WebDocument, size: Size) -> NodeId {
        let node = doc.create_block(size);
        let root = doc.root();
        doc.append_child(root, node).expect("append");
        node
    }

    #[test]
    fn stacked_children_measure_as_block() {
        let mut doc = WebDocument::new();
        let container = doc.create_element("div").unwrap();
        let root = doc.root();
        doc.append_child(root, container).unwrap();
        let a = doc.create_block(Size::new(100.0, 20.0));
        let b = doc.create_block(Size::new(300.0, 40.0));
        doc.append_child(container, a).unwrap();
        doc.append_child(container, b).unwrap();
        let size = doc.measure(container, BoxExtents::all()).unwrap();
        assert_eq!(size, Size::new(300.0, 60.0));
    }

    #[test]
    fn box_extents_select_layers() {
        let mut doc = WebDocument::new();
        let node = attached_block(&mut doc, Size::new(100.0, 100.0));
        doc.set_box_model(
            node,
            BoxModel {
                padding: Sides::all(5.0),
                border: Sides::all(1.0),
                margin: Sides::all(10.0),
            },
        )
        .unwrap();
        assert_eq!(
            doc.measure(node, BoxExtents::empty()).unwrap(),
            Size::new(100.0, 100.0)
        );
        assert_eq!(
            doc.measure(node, BoxExtents::PADDING).unwrap(),
            Size::new(110.0, 110.0)
        );
        assert_eq!(
            doc.measure(node, BoxExtents::all()).unwrap(),
            Size::new(132.0, 132.0)
        );
    }

    #[test]
    fn hidden_or_detached_nodes_measure_zero() {
        let mut doc = WebDocument::new();
        let node = attached_block(&mut doc, Size::new(50.0, 50.0));
        doc.set_style(node, "display", StyleValue::from("none")).unwrap();
        assert_eq!(doc.measure(node, BoxExtents::all()).unwrap(), Size::ZERO);

        let loose = doc.create_block(Size::new(50.0, 50.0));
        assert_eq!(doc.measure(loose, BoxExtents::all()).unwrap(), Size::ZERO);
    }

    #[test]
    fn explicit_pixel_styles_override_content() {
        let mut doc = WebDocument::new();
        let node = attached_block(&mut doc, Size::new(50.0, 50.0));
        doc.set_style(node, "width", StyleValue::Px(80.0)).unwrap();
        assert_eq!(
            doc.measure(node, BoxExtents::all()).unwrap(),
            Size::new(80.0, 50.0)
        );
    }

    #[test]
    fn descendant_rules_follow_parent_class() {
        let mut doc = WebDocument::new();
        doc.add_descendant_rule(
            "lightbox",
            BoxModel {
                padding: Sides::all(8.0),
                ..BoxModel::default()
            },
        );
        let wrapper = doc.create_element("div").unwrap();
        let root = doc.root();
        doc.append_child(root, wrapper).unwrap();
        let content = doc.create_block(Size::new(100.0, 100.0));
        doc.append_child(wrapper, content).unwrap();
        assert_eq!(
            doc.measure(wrapper, BoxExtents::all()).unwrap(),
            Size::new(100.0, 100.0)
        );
        doc.add_class(wrapper, "lightbox").unwrap();
        assert_eq!(
            doc.measure(wrapper, BoxExtents::all()).unwrap(),
            Size::new(116.0, 116.0)
        );
    }

    #[test]
    fn insert_before_and_siblings() {
        let mut doc = WebDocument::new();
        let a = attached_block(&mut doc, Size::ZERO);
        let c = attached_block(&mut doc, Size::ZERO);
        let b = doc.create_block(Size::ZERO);
        let root = doc.root();
        doc.insert_before(root, b, Some(c)).unwrap();
        assert_eq!(doc.children(root), vec![a, b, c]);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.next_sibling(c), None);
    }

    #[test]
    fn hierarchy_errors() {
        let mut doc = WebDocument::new();
        let outer = attached_block(&mut doc, Size::ZERO);
        let inner = doc.create_block(Size::ZERO);
        doc.append_child(outer, inner).unwrap();
        assert_eq!(
            doc.append_child(inner, outer),
            Err(WebDocumentError::Hierarchy {
                parent: inner,
                child: outer
            })
        );
        let root = doc.root();
        assert_eq!(doc.detach(root), Err(WebDocumentError::RootMutation));
        let stranger = doc.create_block(Size::ZERO);
        assert_eq!(
            doc.insert_before(root, inner, Some(stranger)),
            Err(WebDocumentError::NotAChild {
                parent: root,
                reference: stranger
            })
        );
    }

    #[test]
    fn destroy_releases_subtree() {
        let mut doc = WebDocument::new();
        let outer = attached_block(&mut doc, Size::ZERO);
        let inner = doc.create_block(Size::ZERO);
        doc.append_child(outer, inner).unwrap();
        let before = doc.node_count();
        doc.destroy(outer).unwrap();
        assert_eq!(doc.node_count(), before - 2);
        assert!(!doc.is_alive(inner));
        assert_eq!(
            doc.set_style(inner, "display", StyleValue::from("block")),
            Err(WebDocumentError::UnknownNode(inner))
        );
    }

    #[test]
    fn deep_clone_copies_images() {
        let mut doc = WebDocument::new();
        let wrapper = doc.create_element("div").unwrap();
        let img = doc.create_image("a.png", Size::new(10.0, 10.0));
        doc.append_child(wrapper, img).unwrap();
        let copy = doc.clone_node(wrapper, true).unwrap();
        assert_ne!(copy, wrapper);
        assert_eq!(doc.image_sources(copy), vec!["a.png".to_owned()]);
        assert_eq!(doc.parent(copy), None);
        let shallow = doc.clone_node(wrapper, false).unwrap();
        assert!(doc.children(shallow).is_empty());
    }

    #[test]
    fn listeners_register_and_remove() {
        let mut doc = WebDocument::new();
        let handle = doc
            .add_listener(ListenerTarget::Window, ListenerKind::Resize)
            .unwrap();
        assert_eq!(doc.listener_count(), 1);
        assert_eq!(
            doc.listener_count_for(ListenerTarget::Window, ListenerKind::Resize),
            1
        );
        doc.remove_listener(handle).unwrap();
        assert_eq!(doc.listener_count(), 0);
        assert_eq!(
            doc.remove_listener(handle),
            Err(WebDocumentError::UnknownListener(handle))
        );
    }

    #[test]
    fn contains_is_inclusive() {
        let mut doc = WebDocument::new();
        let outer = attached_block(&mut doc, Size::ZERO);
        let inner = doc.create_block(Size::ZERO);
        doc.append_child(outer, inner).unwrap();
        assert!(doc.contains(outer, outer));
        assert!(doc.contains(outer, inner));
        assert!(!doc.contains(inner, outer));
    }
}
