//! X11-specific implementations.
//!
//! This module provides the concrete backend for the
//! [`WindowSystem`](crate::traits::WindowSystem) trait, powered by `x11rb`.
//! The window manager is expected to follow EWMH.

pub mod atoms;
pub mod wm;
