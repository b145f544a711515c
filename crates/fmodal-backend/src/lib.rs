#![forbid(unsafe_code)]
#![doc = "Backend traits for FrankenModal: host abstraction for the document, viewport, and image loading."]
#![doc = ""]
#![doc = "This crate defines the boundary between the modal controller and the"]
#![doc = "embedding environment (a browser DOM bridge, or the in-memory host in"]
#![doc = "`fmodal-web`). The controller never touches a global document or window;"]
#![doc = "every query and mutation flows through these traits."]

use core::fmt;

use bitflags::bitflags;
use fmodal_core::completion::Completion;
use fmodal_core::event::ListenerKind;
use fmodal_core::geometry::{Point, Size};
use fmodal_core::node::NodeId;

bitflags! {
    /// Which box-model layers a measurement includes on top of the content box.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoxExtents: u8 {
        const PADDING = 0b001;
        const BORDER  = 0b010;
        const MARGIN  = 0b100;
    }
}

impl Default for BoxExtents {
    fn default() -> Self {
        Self::all()
    }
}

/// A CSS property value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// A length in pixels (`212px`).
    Px(f64),
    /// A unitless number (`0.5`, `49`).
    Number(f64),
    /// A keyword or raw token (`none`, `absolute`, `#000000`).
    Keyword(String),
}

impl StyleValue {
    /// Convenience constructor for keywords.
    pub fn keyword(value: impl Into<String>) -> Self {
        Self::Keyword(value.into())
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Keyword(v) => f.write_str(v),
        }
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::Keyword(value.to_owned())
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Window,
    Document,
    Node(NodeId),
}

/// Handle returned by [`DocumentHost::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Node tree manipulation, styling, measurement, and listener registration.
///
/// Mirrors the subset of the DOM a modal needs. Nodes are addressed by
/// [`NodeId`]; a detached node stays alive until [`destroy`](Self::destroy).
pub trait DocumentHost {
    /// Host-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The document root nodes are attached under (`document.body`).
    fn root(&self) -> NodeId;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Result<NodeId, Self::Error>;

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Self::Error>;

    /// Insert `child` before `reference` (or append when `None`).
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), Self::Error>;

    /// Remove `node` from its parent. The node and its subtree stay alive.
    fn detach(&mut self, node: NodeId) -> Result<(), Self::Error>;

    /// Release `node` and its subtree permanently.
    fn destroy(&mut self, node: NodeId) -> Result<(), Self::Error>;

    /// Detach every child of `node`.
    fn clear_children(&mut self, node: NodeId) -> Result<(), Self::Error>;

    /// Copy `node` (and its subtree when `deep`) into a new detached node.
    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, Self::Error>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Inclusive containment: a node contains itself.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn set_style(
        &mut self,
        node: NodeId,
        property: &str,
        value: StyleValue,
    ) -> Result<(), Self::Error>;

    /// Apply several declarations in order.
    fn set_styles<I>(&mut self, node: NodeId, declarations: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = (&'static str, StyleValue)>,
    {
        for (property, value) in declarations {
            self.set_style(node, property, value)?;
        }
        Ok(())
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), Self::Error>;

    /// Sources of every `<img>` in the subtree rooted at `node`, in document order.
    fn image_sources(&self, node: NodeId) -> Vec<String>;

    /// Rendered size of `node` including the requested box layers.
    fn measure(&self, node: NodeId, extents: BoxExtents) -> Result<Size, Self::Error>;

    fn add_listener(
        &mut self,
        target: ListenerTarget,
        kind: ListenerKind,
    ) -> Result<ListenerHandle, Self::Error>;

    fn remove_listener(&mut self, handle: ListenerHandle) -> Result<(), Self::Error>;
}

/// Viewport and scroll queries (`window.getSize`, `getScroll`, `getScrollSize`).
pub trait ViewportHost {
    /// Visible window size.
    fn viewport_size(&self) -> Size;

    /// Current scroll offset of the window.
    fn scroll_offset(&self) -> Point;

    /// Total scrollable document size; never smaller than the viewport.
    fn scroll_size(&self) -> Size;
}

/// Outcome of an image preload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreloadReport {
    pub loaded: usize,
    pub failed: usize,
}

impl PreloadReport {
    /// Total number of images that settled.
    #[must_use]
    pub const fn settled(&self) -> usize {
        self.loaded + self.failed
    }
}

/// Off-screen image preloading.
pub trait ImageLoader {
    /// Start loading `urls`. The completion resolves once every image has
    /// either loaded or failed.
    fn preload(&mut self, urls: &[String]) -> Completion<PreloadReport>;
}

/// Unified backend combining the three host capabilities.
///
/// The modal controller is generic over this trait. Concrete implementations:
/// - `fmodal-web`: host-driven in-memory document for WASM embedding and tests.
pub trait ModalBackend {
    /// Host error type shared with the document.
    type Error: std::error::Error + Send + Sync + 'static;

    type Document: DocumentHost<Error = Self::Error>;

    type Viewport: ViewportHost;

    type Images: ImageLoader;

    fn document(&self) -> &Self::Document;

    fn document_mut(&mut self) -> &mut Self::Document;

    fn viewport(&self) -> &Self::Viewport;

    /// Split borrow for operations that need the document and the loader at once.
    fn document_and_images(&mut self) -> (&mut Self::Document, &mut Self::Images);
}
