//! Vocabulary shared by every component.
//!
//! [`Action`] names what a button press asks for, [`ButtonBindings`] maps
//! physical buttons onto actions, [`Event`] is what the window system
//! delivers and [`Message`] is what wheeldesk sends back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque window handle as used by the window system.
pub type Window = u32;

/// Physical pointer button number (X11 counts from 1, wheel is 4/5).
pub type Button = u8;

/// Source-class value for requests coming from a pager or taskbar.
pub const SOURCE_PAGER: u32 = 2;

/// Logical action bound to a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Go to the previous desktop (wheel up).
    DesktopUp,
    /// Go to the next desktop (wheel down).
    DesktopDown,
    /// Bring the bottom-most window of the current desktop forward.
    WindowNext,
    /// Bring the window beneath the active one forward.
    WindowPrev,
}

impl Action {
    /// Desktop actions are the primary bindings; they are subject to the
    /// root-window grab policy.
    pub fn is_primary(self) -> bool {
        matches!(self, Action::DesktopUp | Action::DesktopDown)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::DesktopUp => write!(f, "desktop-up"),
            Action::DesktopDown => write!(f, "desktop-down"),
            Action::WindowNext => write!(f, "window-next"),
            Action::WindowPrev => write!(f, "window-prev"),
        }
    }
}

/// Mapping from each [`Action`] to the button that triggers it.
///
/// `None` disables the action.  Bindings are fixed once the event loop
/// starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonBindings {
    pub desktop_up: Option<Button>,
    pub desktop_down: Option<Button>,
    pub window_next: Option<Button>,
    pub window_prev: Option<Button>,
}

impl Default for ButtonBindings {
    fn default() -> Self {
        Self {
            desktop_up: Some(4),
            desktop_down: Some(5),
            window_next: None,
            window_prev: None,
        }
    }
}

impl ButtonBindings {
    /// Every configured `(action, button)` pair, primary bindings first.
    pub fn iter(&self) -> impl Iterator<Item = (Action, Button)> {
        [
            (Action::DesktopUp, self.desktop_up),
            (Action::DesktopDown, self.desktop_down),
            (Action::WindowNext, self.window_next),
            (Action::WindowPrev, self.window_prev),
        ]
        .into_iter()
        .filter_map(|(action, button)| button.map(|b| (action, b)))
    }

    /// The action bound to `button`, if any.
    ///
    /// When the same button is bound twice the first action in
    /// [`iter`](Self::iter) order wins.
    pub fn action_for(&self, button: Button) -> Option<Action> {
        self.iter()
            .find(|(_, b)| *b == button)
            .map(|(action, _)| action)
    }

    /// Drop the desktop bindings, keeping only window cycling.
    pub fn cycle_only(self) -> Self {
        Self {
            desktop_up: None,
            desktop_down: None,
            ..self
        }
    }

    pub fn has_desktop_bindings(&self) -> bool {
        self.desktop_up.is_some() || self.desktop_down.is_some()
    }

    pub fn has_cycle_bindings(&self) -> bool {
        self.window_next.is_some() || self.window_prev.is_some()
    }
}

/// Desktop counters read from the root window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesktopState {
    pub current: u32,
    pub count: u32,
}

/// One window of the stacking order together with the desktop it lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEntry {
    pub window: Window,
    pub desktop: Option<u32>,
}

/// Events the loop cares about.  Everything else is folded into
/// [`Event::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A window was destroyed.
    Destroyed(Window),
    /// A pointer button went down on `window`.
    ButtonPress {
        window: Window,
        button: Button,
        time: u32,
    },
    Other,
}

/// Requests sent to the window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// `_NET_CURRENT_DESKTOP` request.
    SetCurrentDesktop { desktop: u32, time: u32 },
    /// `_NET_ACTIVE_WINDOW` request on `window`, sent as a pager.
    ActivateWindow {
        window: Window,
        time: u32,
        current_active: Option<Window>,
    },
    /// Lower `window` one level, to just below `sibling`.
    LowerWindow { window: Window, sibling: Window },
}
