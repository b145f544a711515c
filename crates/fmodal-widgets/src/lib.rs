#![forbid(unsafe_code)]

//! Widgets for FrankenModal.
//!
//! The only widget today is the [`modal`] dialog: a page-covering overlay
//! plus a centred content panel, driven by host events.

pub mod modal;

pub use modal::{
    BridgeAction, ContentMeasurer, ContentOptions, EventBridge, LoadMode, ModalConfig,
    ModalConfigError, ModalController, ModalError, Notification, Recompute, ShowState,
    SizePolicy,
};
