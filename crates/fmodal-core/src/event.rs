#![forbid(unsafe_code)]

//! Canonical host events.
//!
//! The embedding environment translates raw window/document events into
//! [`HostEvent`] values and pushes them into the modal controller. All
//! events derive `Clone` and `PartialEq` for use in tests and pattern
//! matching.
//!
//! # Design Notes
//!
//! - `KeyEventKind` defaults to `Press` when the host cannot distinguish
//! - Scroll and click events carry the originating node when known

use crate::node::NodeId;

/// Canonical host event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The window was resized. The new size is queried from the viewport host.
    Resize,

    /// Something scrolled.
    ///
    /// `target` is the node whose scroll position changed, or `None` when the
    /// window itself scrolled.
    Scroll {
        target: Option<NodeId>,
    },

    /// A document-level keyboard event.
    Key(KeyEvent),

    /// A primary-button click on `target`.
    Click {
        target: NodeId,
    },

    /// The embedding application mutated the panel content in place.
    ContentChanged,
}

impl HostEvent {
    /// The listener kind that must be bound for this event to be delivered.
    ///
    /// `ContentChanged` is not a document listener and returns `None`.
    #[must_use]
    pub const fn listener_kind(&self) -> Option<ListenerKind> {
        match self {
            Self::Resize => Some(ListenerKind::Resize),
            Self::Scroll { .. } => Some(ListenerKind::Scroll),
            Self::Key(_) => Some(ListenerKind::KeyDown),
            Self::Click { .. } => Some(ListenerKind::Click),
            Self::ContentChanged => None,
        }
    }
}

/// Kinds of host listeners the modal binds while showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    Resize,
    Scroll,
    KeyDown,
    Click,
}

impl ListenerKind {
    /// DOM event type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Scroll => "scroll",
            Self::KeyDown => "keydown",
            Self::Click => "click",
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A press of `code`.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is an Escape press (repeats included).
    #[must_use]
    pub const fn is_escape_press(&self) -> bool {
        matches!(self.code, KeyCode::Escape)
            && matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// Function key (F1-F24).
    F(u8),
    /// Anything the host could not map.
    Unidentified,
}

impl KeyCode {
    /// Map a DOM `KeyboardEvent.key` value to a key code.
    ///
    /// Accepts the legacy `"Esc"` spelling that older engines report.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Self::Escape,
            "Enter" => Self::Enter,
            "Backspace" => Self::Backspace,
            "Tab" => Self::Tab,
            "Delete" | "Del" => Self::Delete,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "ArrowUp" | "Up" => Self::Up,
            "ArrowDown" | "Down" => Self::Down,
            "ArrowLeft" | "Left" => Self::Left,
            "ArrowRight" | "Right" => Self::Right,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    (Some('F'), Some(_)) => key[1..]
                        .parse::<u8>()
                        .ok()
                        .filter(|n| (1..=24).contains(n))
                        .map_or(Self::Unidentified, Self::F),
                    _ => Self::Unidentified,
                }
            }
        }
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}
