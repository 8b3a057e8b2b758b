//! **wheeldesk**: switch virtual desktops and cycle windows with the mouse
//! wheel.
//!
//! The daemon tracks a handful of windows (by default the file manager's
//! desktop window), grabs wheel buttons on them and turns each press into an
//! EWMH request to the window manager.  When every tracked window is gone,
//! or termination is requested, it releases its grabs and exits.
//!
//! # Architecture
//!
//! The crate is organised around one trait:
//!
//! * [`traits::WindowSystem`] abstracts the display-server queries and
//!   requests so that window lookup, grab bookkeeping, request translation
//!   and the main loop are not coupled to a live X server.
//!
//! The concrete implementation lives in [`x11`].  [`locator`] finds the
//! windows, [`registry`] tracks them, [`grab`] installs the button grabs,
//! [`switcher`] turns presses into requests and [`event_loop`] ties it all
//! together.

pub mod cli;
pub mod command;
pub mod config;
pub mod event_loop;
pub mod grab;
pub mod locator;
pub mod registry;
pub mod switcher;
pub mod traits;
pub mod x11;

#[cfg(test)]
mod testing;
