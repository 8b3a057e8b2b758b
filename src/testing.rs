//! In-memory [`WindowSystem`] used by the unit tests.
//!
//! Every request is recorded so tests can assert on exactly what would have
//! gone over the wire.

use crate::command::{Button, DesktopState, Event, Message, Window};
use crate::grab::Modifiers;
use crate::traits::WindowSystem;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

pub const ROOT: Window = 1;

#[derive(Debug, thiserror::Error)]
#[error("fake window system error: {0}")]
pub struct FakeError(pub &'static str);

#[derive(Debug, Default)]
pub struct FakeSystem {
    pub tree: HashMap<Window, Vec<Window>>,
    pub classes: HashMap<Window, String>,
    pub titles: HashMap<Window, String>,
    /// Windows whose children cannot be queried.
    pub broken: HashSet<Window>,
    /// Windows whose properties cannot be read, as if already destroyed.
    pub unreadable: HashSet<Window>,
    /// Number of root queries that report an empty tree before the real one
    /// shows up.
    pub hidden_polls: Cell<u32>,
    pub children_queries: RefCell<Vec<Window>>,

    pub watched: RefCell<Vec<(Window, bool)>>,
    pub grabs: RefCell<Vec<(Window, Button, Modifiers)>>,
    pub ungrabs: RefCell<Vec<(Window, Button)>>,

    pub desktop: Cell<Option<DesktopState>>,
    pub active: Cell<Option<Window>>,
    pub stacking: RefCell<Vec<Window>>,
    pub desktops: RefCell<HashMap<Window, u32>>,

    pub fail_send: Cell<bool>,
    pub sent: RefCell<Vec<Message>>,
    pub flushes: RefCell<Vec<bool>>,
    pub events: RefCell<VecDeque<Event>>,
    pub fail_poll: Cell<bool>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_child(mut self, parent: Window, child: Window) -> Self {
        self.tree.entry(parent).or_default().push(child);
        self
    }

    pub fn with_class(mut self, window: Window, class: &str) -> Self {
        self.classes.insert(window, class.into());
        self
    }

    pub fn with_title(mut self, window: Window, title: &str) -> Self {
        self.titles.insert(window, title.into());
        self
    }

    pub fn with_desktops(self, current: u32, count: u32) -> Self {
        self.desktop.set(Some(DesktopState { current, count }));
        self
    }

    /// Set the stacking order, bottom first, as `(window, desktop)` pairs.
    pub fn with_stack(self, stack: &[(Window, u32)], active: Window) -> Self {
        *self.stacking.borrow_mut() = stack.iter().map(|(w, _)| *w).collect();
        *self.desktops.borrow_mut() = stack.iter().copied().collect();
        self.active.set(Some(active));
        self
    }

    pub fn push_event(&self, event: Event) {
        self.events.borrow_mut().push_back(event);
    }

    fn check_readable(&self, window: Window) -> Result<(), FakeError> {
        if self.unreadable.contains(&window) {
            return Err(FakeError("BadWindow"));
        }
        Ok(())
    }

    pub fn press(&self, window: Window, button: Button) {
        self.push_event(Event::ButtonPress {
            window,
            button,
            time: 1000,
        });
    }
}

impl WindowSystem for FakeSystem {
    type Error = FakeError;

    fn root(&self) -> Window {
        ROOT
    }

    fn children(&self, window: Window) -> Result<Vec<Window>, FakeError> {
        self.children_queries.borrow_mut().push(window);
        if self.broken.contains(&window) {
            return Err(FakeError("query tree failed"));
        }
        if window == ROOT && self.hidden_polls.get() > 0 {
            self.hidden_polls.set(self.hidden_polls.get() - 1);
            return Ok(Vec::new());
        }
        Ok(self.tree.get(&window).cloned().unwrap_or_default())
    }

    fn window_class(&self, window: Window) -> Result<Option<String>, FakeError> {
        self.check_readable(window)?;
        Ok(self.classes.get(&window).cloned())
    }

    fn window_title(&self, window: Window) -> Result<Option<String>, FakeError> {
        self.check_readable(window)?;
        Ok(self.titles.get(&window).cloned())
    }

    fn watch(&self, window: Window, button_press: bool) -> Result<(), FakeError> {
        self.watched.borrow_mut().push((window, button_press));
        Ok(())
    }

    fn grab_button(
        &self,
        window: Window,
        button: Button,
        modifiers: Modifiers,
    ) -> Result<(), FakeError> {
        self.grabs.borrow_mut().push((window, button, modifiers));
        Ok(())
    }

    fn ungrab_button(&self, window: Window, button: Button) -> Result<(), FakeError> {
        self.ungrabs.borrow_mut().push((window, button));
        Ok(())
    }

    fn desktop_state(&self) -> Result<Option<DesktopState>, FakeError> {
        Ok(self.desktop.get())
    }

    fn active_window(&self) -> Result<Option<Window>, FakeError> {
        Ok(self.active.get())
    }

    fn stacking_order(&self) -> Result<Vec<Window>, FakeError> {
        Ok(self.stacking.borrow().clone())
    }

    fn window_desktop(&self, window: Window) -> Result<Option<u32>, FakeError> {
        self.check_readable(window)?;
        Ok(self.desktops.borrow().get(&window).copied())
    }

    fn send(&self, message: &Message) -> Result<(), FakeError> {
        if self.fail_send.get() {
            return Err(FakeError("send failed"));
        }
        self.sent.borrow_mut().push(*message);
        Ok(())
    }

    fn flush(&self, sync: bool) -> Result<(), FakeError> {
        self.flushes.borrow_mut().push(sync);
        Ok(())
    }

    fn poll_event(&self) -> Result<Option<Event>, FakeError> {
        if self.fail_poll.get() {
            return Err(FakeError("connection closed"));
        }
        Ok(self.events.borrow_mut().pop_front())
    }
}
