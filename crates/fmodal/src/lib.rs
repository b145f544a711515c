#![forbid(unsafe_code)]

//! FrankenModal public facade crate.
//!
//! Re-exports the types most embedders need and offers a small prelude.
//! With the default `web` feature it also provides [`WebModal`], a modal
//! wired to the in-memory host.

// --- Core re-exports -------------------------------------------------------

pub use fmodal_core::completion::{Completion, Resolver};
pub use fmodal_core::event::{HostEvent, KeyCode, KeyEvent, KeyEventKind, ListenerKind};
pub use fmodal_core::geometry::{Point, Rect, Sides, Size};
pub use fmodal_core::node::NodeId;

// --- Host re-exports -------------------------------------------------------

pub use fmodal_backend::{
    BoxExtents, DocumentHost, ImageLoader, ListenerHandle, ListenerTarget, ModalBackend,
    PreloadReport, StyleValue, ViewportHost,
};

// --- Layout re-exports -----------------------------------------------------

pub use fmodal_layout::{Overflow, PanelGeometry, PanelPosition, PanelRequest};

// --- Widget re-exports -----------------------------------------------------

pub use fmodal_widgets::modal::{
    Configurable, ContentOptions, Emitter, LoadMode, MeasureLayers, ModalConfig,
    ModalConfigError, ModalController, ModalError, Notification, Recompute, ShowState,
    SubscriptionId,
};

// --- In-memory host --------------------------------------------------------

#[cfg(feature = "web")]
pub use fmodal_web::{ImageOutcome, WebBackend, WebDocument, WebImageLoader, WebViewport};

/// A modal driven by the in-memory host.
#[cfg(feature = "web")]
pub type WebModal = ModalController<WebBackend>;

/// Build and attach a modal on a fresh in-memory document.
#[cfg(feature = "web")]
pub fn web_modal(config: ModalConfig, viewport: WebViewport) -> std::result::Result<WebModal, ModalError> {
    let mut modal = ModalController::new(config, WebBackend::new(viewport));
    modal.attach()?;
    Ok(modal)
}

/// Standard result type for modal operations.
pub type Result<T> = std::result::Result<T, ModalError>;

pub mod prelude {
    pub use crate::{
        ContentOptions, Emitter, HostEvent, ModalConfig, ModalController, ModalError,
        Notification, ShowState,
    };

    #[cfg(feature = "web")]
    pub use crate::{WebModal, web_modal};
}

pub use fmodal_backend as backend;
pub use fmodal_core as core;
pub use fmodal_layout as layout;
pub use fmodal_widgets as widgets;
