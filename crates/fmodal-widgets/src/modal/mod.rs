#![forbid(unsafe_code)]

//! Modal dialog: overlay, panel, and their lifecycle.

mod bridge;
mod config;
mod controller;
mod measure;
mod notify;

pub use bridge::{BridgeAction, EventBridge, Recompute};
pub use config::{
    Configurable, ContentOptions, LoadMode, MeasureLayers, ModalConfig, ModalConfigError,
};
pub use controller::{ModalController, ModalError, ShowState};
pub use measure::{
    ContentMeasurer, MeasurePurpose, MeasureTicket, Measured, SizePolicy, measure_offscreen,
};
pub use notify::{Emitter, Notification, Notifier, SubscriptionId};
