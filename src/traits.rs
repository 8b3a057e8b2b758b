//! The seam between wheeldesk and the window system.
//!
//! The locator, grab manager, translator and event loop only ever talk to a
//! [`WindowSystem`].  The X11 implementation lives in [`crate::x11`]; tests
//! use an in-memory double that records every request.

use crate::command::{Button, DesktopState, Event, Message, Window};
use crate::grab::Modifiers;

/// Abstraction over a window system that can report its window tree, deliver
/// pointer events and accept window-manager requests.
pub trait WindowSystem {
    /// The error type produced by this window system.
    type Error: std::error::Error + Send + 'static;

    /// The root window of the screen wheeldesk runs on.
    fn root(&self) -> Window;

    /// Children of `window`, in the order the window system reports them.
    fn children(&self, window: Window) -> Result<Vec<Window>, Self::Error>;

    /// Instance part of the window's class hint.
    fn window_class(&self, window: Window) -> Result<Option<String>, Self::Error>;

    /// Window title.
    fn window_title(&self, window: Window) -> Result<Option<String>, Self::Error>;

    /// Subscribe to destruction of `window`.  With `button_press` set, plain
    /// button presses on the window are delivered too, without a grab.
    fn watch(&self, window: Window, button_press: bool) -> Result<(), Self::Error>;

    /// Grab `button` on `window` under exactly `modifiers`.
    fn grab_button(
        &self,
        window: Window,
        button: Button,
        modifiers: Modifiers,
    ) -> Result<(), Self::Error>;

    /// Release every grab of `button` on `window`, whatever the modifiers.
    fn ungrab_button(&self, window: Window, button: Button) -> Result<(), Self::Error>;

    /// Current desktop and desktop count, or `None` if either is missing.
    fn desktop_state(&self) -> Result<Option<DesktopState>, Self::Error>;

    /// The focused window, or `None` when nothing is focused.
    fn active_window(&self) -> Result<Option<Window>, Self::Error>;

    /// Managed windows from bottom to top.
    fn stacking_order(&self) -> Result<Vec<Window>, Self::Error>;

    /// Desktop the window is assigned to.
    fn window_desktop(&self, window: Window) -> Result<Option<u32>, Self::Error>;

    /// Queue a request for the window manager.
    fn send(&self, message: &Message) -> Result<(), Self::Error>;

    /// Push queued requests out.  With `sync` set, wait until the server has
    /// processed them.
    fn flush(&self, sync: bool) -> Result<(), Self::Error>;

    /// Take the next queued event without blocking.
    fn poll_event(&self) -> Result<Option<Event>, Self::Error>;
}
