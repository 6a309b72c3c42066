//! Keyboard input for the suggestion popup.
//!
//! Hosts convert native key events into a `SuggestionKey` (DOM `KeyboardEvent.key`
//! names are accepted directly) and prevent the default action when the
//! result is `Handled`.

/// Modifier key state at the time of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Any modifier that turns a key into a shortcut.
    pub fn has_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// Keys the suggestion popup reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestionKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Tab,
    Escape,
    /// Anything else, including keys pressed with command modifiers.
    Other,
}

impl SuggestionKey {
    /// Parse a DOM key name.
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            _ => Self::Other,
        }
    }

    /// Parse a key press; command-modified keys never drive the popup.
    pub fn from_key_press(name: &str, modifiers: Modifiers) -> Self {
        if modifiers.has_command() {
            Self::Other
        } else {
            Self::from_key_name(name)
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Consumed by the popup, prevent default.
    Handled,
    /// Let the editor handle it.
    PassThrough,
}

impl KeyResult {
    pub fn is_handled(self) -> bool {
        self == KeyResult::Handled
    }
}
