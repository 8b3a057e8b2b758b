//! Command-line surface and startup errors.
//!
//! [`Args`] is parsed with `clap`; [`Settings`] merges it with the
//! [`Config`] file, flags winning.  [`StartupError`] carries the exit code
//! the process ends with.

use crate::command::{Button, ButtonBindings};
use crate::config::{Config, ConfigError};
use crate::event_loop::LoopError;
use crate::grab::ExtraModifier;
use crate::locator::{LocateError, MatchBy, Target};
use crate::x11::wm::X11Error;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Switch desktops and cycle windows with the mouse wheel.
///
/// Button presses are grabbed on the given windows (by default the
/// `x-nautilus-desktop` window).  `root` names the root window; `0x…` names a
/// window by id.
#[derive(Parser, Debug, Default)]
#[command(name = "wheeldesk", version, about, long_about = None)]
pub struct Args {
    /// Match windows by class (default)
    #[arg(short = 'c', long, overrides_with = "by_name")]
    pub by_class: bool,

    /// Match windows by title
    #[arg(short = 'n', long, overrides_with = "by_class")]
    pub by_name: bool,

    /// Button switching to the previous desktop (0 disables)
    #[arg(long, value_name = "BUTTON")]
    pub up: Option<Button>,

    /// Button switching to the next desktop (0 disables)
    #[arg(long, value_name = "BUTTON")]
    pub down: Option<Button>,

    /// Button bringing the bottom window of the desktop forward (0 disables)
    #[arg(long, value_name = "BUTTON")]
    pub next: Option<Button>,

    /// Button bringing the window beneath the active one forward (0 disables)
    #[arg(long, value_name = "BUTTON")]
    pub prev: Option<Button>,

    /// Grab desktop buttons even on the root window
    #[arg(long)]
    pub grab_root: bool,

    /// Only cycle windows, never switch desktops
    #[arg(long)]
    pub cycle_only: bool,

    /// Also react while this modifier is held
    #[arg(long, value_enum, value_name = "MODIFIER")]
    pub extra_modifier: Option<ExtraModifier>,

    /// Configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// X display to connect to instead of $DISPLAY
    #[arg(long, value_name = "DISPLAY")]
    pub display: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Windows to track
    #[arg(value_name = "WINDOW")]
    pub windows: Vec<String>,
}

/// Everything the daemon needs, after merging flags over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bindings: ButtonBindings,
    pub extra_modifier: Option<ExtraModifier>,
    pub grab_root: bool,
    pub match_by: MatchBy,
    pub targets: Vec<Target>,
    pub retries: u32,
    pub backoff: Duration,
    pub idle_interval: Duration,
    pub sync: bool,
}

/// `Some(0)` on the command line unsets a binding.
fn override_button(flag: Option<Button>, configured: Option<Button>) -> Option<Button> {
    match flag {
        Some(0) => None,
        Some(button) => Some(button),
        None => configured,
    }
}

impl Settings {
    pub fn resolve(args: &Args, config: Config) -> Self {
        let mut bindings = ButtonBindings {
            desktop_up: override_button(args.up, config.bindings.desktop_up),
            desktop_down: override_button(args.down, config.bindings.desktop_down),
            window_next: override_button(args.next, config.bindings.window_next),
            window_prev: override_button(args.prev, config.bindings.window_prev),
        };
        if args.cycle_only {
            bindings = bindings.cycle_only();
        }

        let (targets, match_by) = if args.windows.is_empty() {
            (vec![Target::Named(config.default_window.clone())], MatchBy::Name)
        } else {
            let match_by = if args.by_name {
                MatchBy::Name
            } else {
                MatchBy::Class
            };
            (args.windows.iter().map(|w| Target::parse(w)).collect(), match_by)
        };

        Self {
            bindings,
            extra_modifier: args.extra_modifier.or(config.extra_modifier),
            grab_root: args.grab_root || config.grab_root,
            match_by,
            targets,
            retries: config.discovery.retries,
            backoff: config.discovery.backoff(),
            idle_interval: config.idle_interval(),
            sync: config.sync,
        }
    }
}

/// Fatal startup and runtime failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    WindowSystem(#[from] X11Error),
    #[error(transparent)]
    NotFound(#[from] LocateError),
    #[error(transparent)]
    Loop(#[from] LoopError),
}

/// Exit code for a command line that cannot be parsed.
pub const EXIT_USAGE: u8 = 1;
/// Exit code when no window could be found.
pub const EXIT_NOT_FOUND: u8 = 2;
/// Exit code for connection-level failures.
pub const EXIT_CONNECTION: u8 = 3;

impl StartupError {
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) => EXIT_USAGE,
            StartupError::NotFound(_) => EXIT_NOT_FOUND,
            StartupError::WindowSystem(_) | StartupError::Loop(_) => EXIT_CONNECTION,
        }
    }
}
