#![forbid(unsafe_code)]

//! Host-controlled viewport.

use fmodal_backend::ViewportHost;
use fmodal_core::geometry::{Point, Size};

/// Viewport state pushed by the host (`innerWidth`, `scrollX`, `scrollWidth`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebViewport {
    size: Size,
    scroll: Point,
    document: Size,
}

impl WebViewport {
    /// A viewport showing a document exactly its own size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            scroll: Point::ORIGIN,
            document: Size::new(width, height),
        }
    }

    /// Set the laid-out document size (before clamping to the viewport).
    #[must_use]
    pub fn with_document_size(mut self, width: f64, height: f64) -> Self {
        self.set_document_size(width, height);
        self
    }

    /// Update the visible size. The scroll offset is re-clamped.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
        self.scroll_to(self.scroll);
    }

    pub fn set_document_size(&mut self, width: f64, height: f64) {
        self.document = Size::new(width, height);
        self.scroll_to(self.scroll);
    }

    /// Scroll the window, clamped to the scrollable range.
    pub fn scroll_to(&mut self, target: Point) {
        let extent = self.scroll_size();
        self.scroll = Point::new(
            target.x.clamp(0.0, (extent.width - self.size.width).max(0.0)),
            target.y.clamp(0.0, (extent.height - self.size.height).max(0.0)),
        );
    }
}

impl Default for WebViewport {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

impl ViewportHost for WebViewport {
    fn viewport_size(&self) -> Size {
        self.size
    }

    fn scroll_offset(&self) -> Point {
        self.scroll
    }

    fn scroll_size(&self) -> Size {
        self.document.max(self.size)
    }
}
