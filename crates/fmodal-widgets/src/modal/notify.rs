#![forbid(unsafe_code)]

//! Shown/hidden notifications.

/// Lifecycle notification names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    /// Fired after the overlay and panel become visible.
    Shown,
    /// Fired after the modal is hidden and its content cleared.
    Hidden,
}

impl Notification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shown => "shown",
            Self::Hidden => "hidden",
        }
    }
}

/// Identifies one subscription for [`Emitter::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Something callers can subscribe to for lifecycle notifications.
///
/// Firing stays with the owner; subscribers only listen.
///
/// ```compile_fail
/// use fmodal_web::WebBackend;
/// use fmodal_widgets::modal::{Emitter, ModalConfig, ModalController, Notification};
///
/// let mut modal = ModalController::new(ModalConfig::default(), WebBackend::default());
/// modal.emit(Notification::Shown);
/// ```
pub trait Emitter {
    fn subscribe<F>(&mut self, notification: Notification, handler: F) -> SubscriptionId
    where
        F: FnMut(Notification) + 'static;

    /// Returns `false` when `id` was not subscribed.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

type Handler = Box<dyn FnMut(Notification)>;

/// Ordered handler list keyed by notification.
#[derive(Default)]
pub struct Notifier {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Notification, Handler)>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers registered for `notification`.
    #[must_use]
    pub fn subscriber_count(&self, notification: Notification) -> usize {
        self.handlers
            .iter()
            .filter(|(_, n, _)| *n == notification)
            .count()
    }

    /// Invoke every handler subscribed to `notification`, in subscription order.
    pub fn emit(&mut self, notification: Notification) {
        for (_, n, handler) in &mut self.handlers {
            if *n == notification {
                handler(notification);
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("next_id", &self.next_id)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Emitter for Notifier {
    fn subscribe<F>(&mut self, notification: Notification, handler: F) -> SubscriptionId
    where
        F: FnMut(Notification) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, notification, Box::new(handler)));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _, _)| *sub != id);
        self.handlers.len() != before
    }
}
