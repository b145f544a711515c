#![forbid(unsafe_code)]

//! Host event routing.
//!
//! While the modal is showing it listens for window resize, window scroll,
//! document keydown, and overlay click. [`EventBridge::bind`] registers
//! exactly those four listeners and is idempotent, so repeated show/hide
//! cycles never accumulate handlers. Content-change notices need no
//! registration; they are honoured whenever the bridge is bound.

use fmodal_backend::{DocumentHost, ListenerHandle, ListenerTarget};
use fmodal_core::event::{HostEvent, ListenerKind};
use fmodal_core::node::NodeId;

/// What caused a layout refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recompute {
    /// The viewport changed size.
    Resize,
    /// The window or an element scrolled. `target` is the scrolled element
    /// when it was not the window itself.
    Scroll { target: Option<NodeId> },
    /// Showing content changed size or structure.
    ContentChanged,
}

/// Controller action produced by a routed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeAction {
    Recompute(Recompute),
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    target: ListenerTarget,
    kind: ListenerKind,
    handle: ListenerHandle,
}

/// Listener registrations for one showing period.
#[derive(Debug, Default)]
pub struct EventBridge {
    bindings: Option<Vec<Binding>>,
}

impl EventBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bindings.is_some()
    }

    /// Registered listener count (zero or four).
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.bindings.as_ref().map_or(0, Vec::len)
    }

    fn wanted(overlay: NodeId) -> [(ListenerTarget, ListenerKind); 4] {
        [
            (ListenerTarget::Window, ListenerKind::Resize),
            (ListenerTarget::Window, ListenerKind::Scroll),
            (ListenerTarget::Document, ListenerKind::KeyDown),
            (ListenerTarget::Node(overlay), ListenerKind::Click),
        ]
    }

    /// Register the listeners. Returns `false` if already bound.
    ///
    /// A failed registration removes the listeners added so far.
    pub fn bind<D: DocumentHost>(&mut self, doc: &mut D, overlay: NodeId) -> Result<bool, D::Error> {
        if self.bindings.is_some() {
            return Ok(false);
        }
        let mut bindings = Vec::with_capacity(4);
        for (target, kind) in Self::wanted(overlay) {
            match doc.add_listener(target, kind) {
                Ok(handle) => bindings.push(Binding {
                    target,
                    kind,
                    handle,
                }),
                Err(err) => {
                    for binding in bindings {
                        let _ = doc.remove_listener(binding.handle);
                    }
                    return Err(err);
                }
            }
        }
        self.bindings = Some(bindings);
        Ok(true)
    }

    /// Remove every listener. Returns `false` if nothing was bound.
    ///
    /// All removals are attempted; the first failure is reported.
    pub fn unbind<D: DocumentHost>(&mut self, doc: &mut D) -> Result<bool, D::Error> {
        let Some(bindings) = self.bindings.take() else {
            return Ok(false);
        };
        let mut first_err = None;
        for binding in bindings {
            if let Err(err) = doc.remove_listener(binding.handle) {
                tracing::warn!(
                    message = "modal.unbind.failed",
                    kind = binding.kind.as_str(),
                    target = ?binding.target
                );
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(true),
        }
    }

    /// Translate a host event. Events arriving while unbound are dropped.
    #[must_use]
    pub fn route(&self, event: &HostEvent, overlay: NodeId) -> Option<BridgeAction> {
        if !self.is_bound() {
            return None;
        }
        match event {
            HostEvent::Resize => Some(BridgeAction::Recompute(Recompute::Resize)),
            HostEvent::Scroll { target } => {
                Some(BridgeAction::Recompute(Recompute::Scroll { target: *target }))
            }
            HostEvent::ContentChanged => Some(BridgeAction::Recompute(Recompute::ContentChanged)),
            HostEvent::Key(key) if key.is_escape_press() => Some(BridgeAction::Hide),
            HostEvent::Key(_) => None,
            HostEvent::Click { target } if *target == overlay => Some(BridgeAction::Hide),
            HostEvent::Click { .. } => None,
        }
    }
}
