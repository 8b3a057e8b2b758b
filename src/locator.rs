//! Finding the windows to track.
//!
//! Targets are looked up by walking the window tree depth-first from the
//! root.  The desktop window usually belongs to a file manager or desktop
//! shell that may still be starting when wheeldesk runs, so a lookup that
//! comes back empty is retried a few times before giving up.

use crate::command::Window;
use crate::traits::WindowSystem;
use log::{debug, info, trace, warn};
use std::fmt;
use std::time::Duration;

/// Which window property a [`Target::Named`] is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchBy {
    /// Instance part of `WM_CLASS`.
    #[default]
    Class,
    /// Window title.
    Name,
}

/// A window the user asked to track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The literal `root`.
    Root,
    /// An explicit window id such as `0x1e00003`.
    Id(Window),
    /// A class or title to search for.
    Named(String),
}

impl Target {
    /// Interpret a command-line argument.
    pub fn parse(arg: &str) -> Self {
        if arg == "root" {
            return Target::Root;
        }
        if let Some(hex) = arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
            if let Ok(id) = Window::from_str_radix(hex, 16) {
                return Target::Id(id);
            }
        }
        Target::Named(arg.to_string())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Root => write!(f, "root"),
            Target::Id(id) => write!(f, "0x{:x}", id),
            Target::Named(name) => write!(f, "{:?}", name),
        }
    }
}

/// No target could be found, even after retrying.
#[derive(Debug, thiserror::Error)]
#[error("no window found for {0}")]
pub struct LocateError(pub String);

/// Single lookup without retries.
///
/// `Root` and `Id` targets resolve without touching the window tree.
pub fn locate<W: WindowSystem>(ws: &W, target: &Target, match_by: MatchBy) -> Option<Window> {
    match target {
        Target::Root => Some(ws.root()),
        Target::Id(id) => Some(*id),
        Target::Named(name) => find_by(ws, ws.root(), name, match_by),
    }
}

/// Depth-first search below (and including) `start`.
///
/// Children are visited in the order the window system lists them.  A
/// window whose children or properties cannot be read is treated as a leaf
/// that does not match.
fn find_by<W: WindowSystem>(
    ws: &W,
    start: Window,
    name: &str,
    match_by: MatchBy,
) -> Option<Window> {
    let mut pending = vec![start];
    while let Some(window) = pending.pop() {
        if matches(ws, window, name, match_by) {
            return Some(window);
        }
        match ws.children(window) {
            Ok(children) => pending.extend(children.into_iter().rev()),
            Err(e) => trace!("skipping children of 0x{:x}: {}", window, e),
        }
    }
    None
}

fn matches<W: WindowSystem>(ws: &W, window: Window, name: &str, match_by: MatchBy) -> bool {
    let value = match match_by {
        MatchBy::Class => ws.window_class(window),
        MatchBy::Name => ws.window_title(window),
    };
    matches!(value, Ok(Some(v)) if v == name)
}

/// Lookup with a fixed number of retries.
#[derive(Debug, Clone)]
pub struct Locator {
    retries: u32,
    backoff: Duration,
}

impl Locator {
    pub fn new(retries: u32, backoff: Duration) -> Self {
        Self { retries, backoff }
    }

    /// Look `target` up, sleeping `backoff` between attempts.  Makes at most
    /// `retries + 1` attempts.
    pub fn locate<W: WindowSystem>(
        &self,
        ws: &W,
        target: &Target,
        match_by: MatchBy,
    ) -> Option<Window> {
        for attempt in 0..=self.retries {
            if attempt > 0 {
                debug!("{} not found, retry {}/{}", target, attempt, self.retries);
                std::thread::sleep(self.backoff);
            }
            if let Some(window) = locate(ws, target, match_by) {
                return Some(window);
            }
        }
        None
    }

    /// Resolve every target independently.
    ///
    /// Targets that cannot be found are skipped with a warning; the call only
    /// fails when none of them resolved.  Duplicate windows are kept once.
    pub fn locate_all<W: WindowSystem>(
        &self,
        ws: &W,
        targets: &[Target],
        match_by: MatchBy,
    ) -> Result<Vec<Window>, LocateError> {
        let mut found: Vec<Window> = Vec::new();
        for target in targets {
            match self.locate(ws, target, match_by) {
                Some(window) => {
                    info!("tracking {} as window 0x{:x}", target, window);
                    if !found.contains(&window) {
                        found.push(window);
                    }
                }
                None => warn!("no window found for {}", target),
            }
        }
        if found.is_empty() {
            let names: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
            return Err(LocateError(names.join(", ")));
        }
        Ok(found)
    }
}
