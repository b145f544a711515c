#![forbid(unsafe_code)]

//! `fmodal-web` provides a host-driven backend implementation for FrankenModal.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes viewport
//!   changes, events, and image outcomes.
//! - **Deterministic layout**: the in-memory document measures with a simple
//!   block model, so identical inputs always yield identical geometry.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate intentionally does not bind to `wasm-bindgen` yet. The primary
//! purpose is to provide backend building blocks that a browser shim can
//! mirror into a real DOM, and a faithful host for tests.

pub mod document;
pub mod images;
pub mod viewport;

use fmodal_backend::ModalBackend;

pub use document::{BoxModel, WebDocument, WebDocumentError};
pub use images::{ImageOutcome, WebImageLoader};
pub use viewport::WebViewport;

/// In-memory backend: document, viewport, and image loader.
#[derive(Debug, Default)]
pub struct WebBackend {
    pub document: WebDocument,
    pub viewport: WebViewport,
    pub images: WebImageLoader,
}

impl WebBackend {
    /// Create a backend with an empty document and the given viewport.
    #[must_use]
    pub fn new(viewport: WebViewport) -> Self {
        Self {
            document: WebDocument::new(),
            viewport,
            images: WebImageLoader::new(),
        }
    }
}

impl ModalBackend for WebBackend {
    type Error = WebDocumentError;
    type Document = WebDocument;
    type Viewport = WebViewport;
    type Images = WebImageLoader;

    fn document(&self) -> &Self::Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Self::Document {
        &mut self.document
    }

    fn viewport(&self) -> &Self::Viewport {
        &self.viewport
    }

    fn document_and_images(&mut self) -> (&mut Self::Document, &mut Self::Images) {
        (&mut self.document, &mut self.images)
    }
}
