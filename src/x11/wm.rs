//! [`WindowSystem`] implementation backed by an X11 connection.
//!
//! Desktop switching and window activation are EWMH client messages sent to
//! the root window; the window manager does the actual work.

use super::atoms::{EwmhAtoms, NameAtoms};
use crate::command::{self, Button, DesktopState, Message, SOURCE_PAGER};
use crate::grab::Modifiers;
use crate::traits::WindowSystem;
use log::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
    ConfigureWindowAux, ConnectionExt, EventMask, GrabMode, ModMask, StackMode, Window,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::NONE;

/// `_NET_RESTACK_WINDOW` detail value for "below the sibling".
const RESTACK_BELOW: u32 = 1;

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum X11Error {
    #[error("cannot open display: {0}")]
    Connect(#[from] ConnectError),
    #[error("x11 connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("x11 request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("window manager does not provide {0}")]
    MissingAtoms(String),
}

/// X11-backed window system.
pub struct X11System {
    conn: RustConnection,
    root: Window,
    atoms: EwmhAtoms,
    names: NameAtoms,
}

impl X11System {
    /// Connect to `display` (or `$DISPLAY`) and look up the atoms.
    pub fn connect(display: Option<&str>) -> Result<Self, X11Error> {
        let (conn, screen_num) = x11rb::connect(display)?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = EwmhAtoms::lookup(&conn)?;
        let names = NameAtoms::new(&conn)?.reply()?;
        info!("connected to X11, screen {}, root 0x{:x}", screen_num, root);
        Ok(Self {
            conn,
            root,
            atoms,
            names,
        })
    }

    pub fn atoms(&self) -> &EwmhAtoms {
        &self.atoms
    }

    /// First CARDINAL/WINDOW value of a 32-bit property.
    fn read_u32(&self, window: Window, property: Atom, type_: AtomEnum) -> Result<Option<u32>, X11Error> {
        if property == NONE {
            return Ok(None);
        }
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, 1)?
            .reply()?;
        Ok(reply.value32().and_then(|mut values| values.next()))
    }

    fn read_string(&self, window: Window, property: Atom, type_: Atom) -> Result<Option<String>, X11Error> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX)?
            .reply()?;
        if reply.type_ == NONE || reply.value.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    }
}

/// Instance name from a raw `WM_CLASS` value (`"instance\0class\0"`).
pub fn parse_wm_class(value: &[u8]) -> Option<String> {
    let instance = value.split(|&b| b == 0).next()?;
    if instance.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(instance).into_owned())
}

/// Target window, message type and payload of the client message for
/// `message`.  `None` means the message is not a client message with the
/// atoms available.
pub fn client_message(
    atoms: &EwmhAtoms,
    root: Window,
    message: &Message,
) -> Option<(Window, Atom, [u32; 5])> {
    match *message {
        Message::SetCurrentDesktop { desktop, time } => {
            Some((root, atoms.current_desktop, [desktop, time, 0, 0, 0]))
        }
        Message::ActivateWindow {
            window,
            time,
            current_active,
        } => Some((
            window,
            atoms.active_window,
            [SOURCE_PAGER, time, current_active.unwrap_or(NONE), 0, 0],
        )),
        Message::LowerWindow { window, sibling } if atoms.restack_window != NONE => Some((
            window,
            atoms.restack_window,
            [SOURCE_PAGER, sibling, RESTACK_BELOW, 0, 0],
        )),
        Message::LowerWindow { .. } => None,
    }
}

/// Fold an X11 event into the few events the loop cares about.
fn translate_event(event: Event) -> command::Event {
    match event {
        Event::DestroyNotify(e) => command::Event::Destroyed(e.window),
        Event::ButtonPress(e) => command::Event::ButtonPress {
            window: e.event,
            button: e.detail,
            time: e.time,
        },
        Event::Error(e) => {
            debug!("x11 error event: {:?}", e);
            command::Event::Other
        }
        _ => command::Event::Other,
    }
}

impl WindowSystem for X11System {
    type Error = X11Error;

    fn root(&self) -> Window {
        self.root
    }

    fn children(&self, window: Window) -> Result<Vec<Window>, X11Error> {
        Ok(self.conn.query_tree(window)?.reply()?.children)
    }

    fn window_class(&self, window: Window) -> Result<Option<String>, X11Error> {
        let reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 1024)?
            .reply()?;
        Ok(parse_wm_class(&reply.value))
    }

    fn window_title(&self, window: Window) -> Result<Option<String>, X11Error> {
        let utf8 = self.read_string(window, self.names._NET_WM_NAME, self.names.UTF8_STRING)?;
        if utf8.is_some() {
            return Ok(utf8);
        }
        self.read_string(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())
    }

    fn watch(&self, window: Window, button_press: bool) -> Result<(), X11Error> {
        let mask = if button_press {
            EventMask::STRUCTURE_NOTIFY | EventMask::BUTTON_PRESS
        } else {
            EventMask::STRUCTURE_NOTIFY
        };
        let aux = ChangeWindowAttributesAux::new().event_mask(mask);
        self.conn.change_window_attributes(window, &aux)?.check()?;
        Ok(())
    }

    fn grab_button(&self, window: Window, button: Button, modifiers: Modifiers) -> Result<(), X11Error> {
        self.conn
            .grab_button(
                false,
                window,
                EventMask::BUTTON_PRESS,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                ButtonIndex::from(button),
                ModMask::from(modifiers.bits()),
            )?
            .check()?;
        Ok(())
    }

    fn ungrab_button(&self, window: Window, button: Button) -> Result<(), X11Error> {
        self.conn
            .ungrab_button(ButtonIndex::from(button), window, ModMask::ANY)?;
        Ok(())
    }

    fn desktop_state(&self) -> Result<Option<DesktopState>, X11Error> {
        let count = self.read_u32(self.root, self.atoms.number_of_desktops, AtomEnum::CARDINAL)?;
        let current = self.read_u32(self.root, self.atoms.current_desktop, AtomEnum::CARDINAL)?;
        Ok(match (current, count) {
            (Some(current), Some(count)) => Some(DesktopState { current, count }),
            _ => None,
        })
    }

    fn active_window(&self) -> Result<Option<Window>, X11Error> {
        let active = self.read_u32(self.root, self.atoms.active_window, AtomEnum::WINDOW)?;
        Ok(active.filter(|&w| w != NONE))
    }

    fn stacking_order(&self) -> Result<Vec<Window>, X11Error> {
        if self.atoms.client_list_stacking == NONE {
            return Ok(Vec::new());
        }
        let reply = self
            .conn
            .get_property(
                false,
                self.root,
                self.atoms.client_list_stacking,
                AtomEnum::WINDOW,
                0,
                u32::MAX,
            )?
            .reply()?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    fn window_desktop(&self, window: Window) -> Result<Option<u32>, X11Error> {
        self.read_u32(window, self.atoms.wm_desktop, AtomEnum::CARDINAL)
    }

    fn send(&self, message: &Message) -> Result<(), X11Error> {
        match client_message(&self.atoms, self.root, message) {
            Some((window, type_, data)) => {
                let event = ClientMessageEvent::new(32, window, type_, data);
                self.conn.send_event(
                    false,
                    self.root,
                    EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                    event,
                )?;
            }
            None => {
                if let Message::LowerWindow { window, sibling } = *message {
                    let aux = ConfigureWindowAux::new()
                        .sibling(sibling)
                        .stack_mode(StackMode::BELOW);
                    self.conn.configure_window(window, &aux)?;
                }
            }
        }
        Ok(())
    }

    fn flush(&self, sync: bool) -> Result<(), X11Error> {
        if sync {
            self.conn.sync()?;
        } else {
            self.conn.flush()?;
        }
        Ok(())
    }

    fn poll_event(&self) -> Result<Option<command::Event>, X11Error> {
        Ok(self.conn.poll_for_event()?.map(translate_event))
    }
}
