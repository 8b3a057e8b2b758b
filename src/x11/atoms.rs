//! Atoms used by the X11 backend.
//!
//! The EWMH atoms are looked up with `only_if_exists`: if the window manager
//! never created `_NET_CURRENT_DESKTOP`, it does not speak EWMH and there is
//! nobody to send requests to.  Interning them would only hide that.

use super::wm::X11Error;
use crate::command::ButtonBindings;
use x11rb::protocol::xproto::{Atom, ConnectionExt};
use x11rb::rust_connection::RustConnection;
use x11rb::NONE;

x11rb::atom_manager! {
    /// Atoms needed to read window titles.  Safe to create.
    pub NameAtoms: NameAtomsCookie {
        _NET_WM_NAME,
        UTF8_STRING,
    }
}

/// EWMH atoms; [`NONE`] when the window manager does not provide one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EwmhAtoms {
    pub number_of_desktops: Atom,
    pub current_desktop: Atom,
    pub active_window: Atom,
    pub client_list_stacking: Atom,
    pub wm_desktop: Atom,
    pub restack_window: Atom,
}

const NAMES: [&str; 6] = [
    "_NET_NUMBER_OF_DESKTOPS",
    "_NET_CURRENT_DESKTOP",
    "_NET_ACTIVE_WINDOW",
    "_NET_CLIENT_LIST_STACKING",
    "_NET_WM_DESKTOP",
    "_NET_RESTACK_WINDOW",
];

impl EwmhAtoms {
    /// Look every atom up in one round trip.
    pub fn lookup(conn: &RustConnection) -> Result<Self, X11Error> {
        let cookies = NAMES
            .iter()
            .map(|name| conn.intern_atom(true, name.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut atoms = [NONE; 6];
        for (slot, cookie) in atoms.iter_mut().zip(cookies) {
            *slot = cookie.reply()?.atom;
        }
        Ok(Self {
            number_of_desktops: atoms[0],
            current_desktop: atoms[1],
            active_window: atoms[2],
            client_list_stacking: atoms[3],
            wm_desktop: atoms[4],
            restack_window: atoms[5],
        })
    }

    /// Check that every atom needed by the configured bindings exists.
    /// `_NET_RESTACK_WINDOW` is optional.
    pub fn require(&self, bindings: &ButtonBindings) -> Result<(), X11Error> {
        let mut needed: Vec<(&str, Atom)> = Vec::new();
        if bindings.has_desktop_bindings() {
            needed.push((NAMES[0], self.number_of_desktops));
            needed.push((NAMES[1], self.current_desktop));
        }
        if bindings.has_cycle_bindings() {
            needed.push((NAMES[2], self.active_window));
            needed.push((NAMES[3], self.client_list_stacking));
            needed.push((NAMES[4], self.wm_desktop));
        }
        let missing: Vec<&str> = needed
            .into_iter()
            .filter(|(_, atom)| *atom == NONE)
            .map(|(name, _)| name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(X11Error::MissingAtoms(missing.join(", ")))
        }
    }
}
