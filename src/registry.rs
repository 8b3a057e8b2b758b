//! Windows currently being tracked.

use crate::command::Window;

/// A tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedWindow {
    pub window: Window,
    /// The root window gets a different grab policy.
    pub is_root: bool,
}

/// Ordered set of tracked windows.
///
/// Windows keep the order in which they were added; a window is never listed
/// twice.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    windows: Vec<TrackedWindow>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from located windows, flagging `root`.
    pub fn from_windows(windows: impl IntoIterator<Item = Window>, root: Window) -> Self {
        let mut registry = Self::new();
        for window in windows {
            registry.insert(window, window == root);
        }
        registry
    }

    /// Add a window.  Returns `false` if it was already tracked.
    pub fn insert(&mut self, window: Window, is_root: bool) -> bool {
        if self.contains(window) {
            return false;
        }
        self.windows.push(TrackedWindow { window, is_root });
        true
    }

    /// Stop tracking `window` if it is tracked.
    ///
    /// Returns whether the registry is empty afterwards, so an unknown window
    /// on an empty registry still reports `true`.
    pub fn remove_if_present(&mut self, window: Window) -> bool {
        self.windows.retain(|t| t.window != window);
        self.windows.is_empty()
    }

    pub fn contains(&self, window: Window) -> bool {
        self.windows.iter().any(|t| t.window == window)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedWindow> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }
}
