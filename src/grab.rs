//! Button grabs on tracked windows.
//!
//! A passive grab only fires when the modifier state matches exactly, and
//! lock modifiers (Caps Lock, Num Lock) count.  Every button is therefore
//! grabbed once per lock combination, and once more per combination with the
//! extra modifier when one is configured.

use crate::command::{Button, ButtonBindings, Window};
use crate::registry::TrackedWindow;
use crate::traits::WindowSystem;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Modifier mask in X11 core-protocol bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(pub u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1 << 0);
    /// Caps Lock.
    pub const LOCK: Modifiers = Modifiers(1 << 1);
    pub const CONTROL: Modifiers = Modifiers(1 << 2);
    /// Usually Alt.
    pub const MOD1: Modifiers = Modifiers(1 << 3);
    /// Usually Num Lock.
    pub const MOD2: Modifiers = Modifiers(1 << 4);
    pub const MOD3: Modifiers = Modifiers(1 << 5);
    /// Usually Super.
    pub const MOD4: Modifiers = Modifiers(1 << 6);
    pub const MOD5: Modifiers = Modifiers(1 << 7);

    pub fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// Lock combinations that must not prevent a grab from firing.
pub const LOCK_COMBINATIONS: [Modifiers; 4] = [
    Modifiers::NONE,
    Modifiers::LOCK,
    Modifiers::MOD2,
    Modifiers(Modifiers::LOCK.0 | Modifiers::MOD2.0),
];

/// Modifier that may additionally be held while turning the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtraModifier {
    Shift,
    Control,
    Alt,
    Mod3,
    Super,
    Mod5,
}

impl From<ExtraModifier> for Modifiers {
    fn from(m: ExtraModifier) -> Self {
        match m {
            ExtraModifier::Shift => Modifiers::SHIFT,
            ExtraModifier::Control => Modifiers::CONTROL,
            ExtraModifier::Alt => Modifiers::MOD1,
            ExtraModifier::Mod3 => Modifiers::MOD3,
            ExtraModifier::Super => Modifiers::MOD4,
            ExtraModifier::Mod5 => Modifiers::MOD5,
        }
    }
}

/// Installs and releases button grabs, remembering what it installed.
#[derive(Debug, Clone, Default)]
pub struct GrabManager {
    extra: Option<Modifiers>,
    grab_root: bool,
    installed: Vec<(Window, Button)>,
}

impl GrabManager {
    /// `grab_root` makes desktop bindings grab on the root window too,
    /// instead of relying on plain event delivery there.
    pub fn new(extra: Option<ExtraModifier>, grab_root: bool) -> Self {
        Self {
            extra: extra.map(Modifiers::from),
            grab_root,
            installed: Vec::new(),
        }
    }

    /// Every modifier state a button is grabbed under.
    pub fn combinations(&self) -> Vec<Modifiers> {
        let mut combos = LOCK_COMBINATIONS.to_vec();
        if let Some(extra) = self.extra {
            combos.extend(LOCK_COMBINATIONS.iter().map(|&m| m | extra));
        }
        combos
    }

    /// Set up a freshly tracked window: subscribe to its destruction and grab
    /// its bindings according to the root policy.
    pub fn setup<W: WindowSystem>(
        &mut self,
        ws: &W,
        tracked: &TrackedWindow,
        bindings: &ButtonBindings,
    ) {
        let plain_delivery =
            tracked.is_root && !self.grab_root && bindings.has_desktop_bindings();
        if let Err(e) = ws.watch(tracked.window, plain_delivery) {
            warn!("cannot watch window 0x{:x}: {}", tracked.window, e);
        }
        for (action, button) in bindings.iter() {
            if action.is_primary() && tracked.is_root && !self.grab_root {
                debug!("not grabbing {} on the root window", action);
                continue;
            }
            self.install(ws, tracked.window, Some(button));
        }
    }

    /// Grab `button` on `window` under every combination.
    ///
    /// `None` is a no-op.  Returns whether the button is grabbed afterwards.
    pub fn install<W: WindowSystem>(
        &mut self,
        ws: &W,
        window: Window,
        button: Option<Button>,
    ) -> bool {
        let Some(button) = button else {
            return false;
        };
        if self.is_installed(window, button) {
            return true;
        }
        let mut any = false;
        for modifiers in self.combinations() {
            match ws.grab_button(window, button, modifiers) {
                Ok(()) => any = true,
                Err(e) => warn!(
                    "cannot grab button {} with modifiers {:#x} on 0x{:x}: {}",
                    button,
                    modifiers.bits(),
                    window,
                    e
                ),
            }
        }
        if any {
            debug!("grabbed button {} on 0x{:x}", button, window);
            self.installed.push((window, button));
        }
        any
    }

    /// Release the grab of `button` on `window` under any modifier.
    pub fn remove<W: WindowSystem>(
        &mut self,
        ws: &W,
        window: Window,
        button: Option<Button>,
    ) -> Result<(), W::Error> {
        let Some(button) = button else {
            return Ok(());
        };
        if !self.is_installed(window, button) {
            return Ok(());
        }
        self.installed.retain(|&g| g != (window, button));
        ws.ungrab_button(window, button)
    }

    /// Release everything still installed.  Failures are logged and do not
    /// stop the remaining releases.
    pub fn release_all<W: WindowSystem>(&mut self, ws: &W) {
        for (window, button) in self.installed.clone() {
            if let Err(e) = self.remove(ws, window, Some(button)) {
                warn!("cannot ungrab button {} on 0x{:x}: {}", button, window, e);
            }
        }
    }

    /// Drop the records for a window that no longer exists.  Its grabs went
    /// away with it.
    pub fn forget(&mut self, window: Window) {
        self.installed.retain(|(w, _)| *w != window);
    }

    pub fn is_installed(&self, window: Window, button: Button) -> bool {
        self.installed.contains(&(window, button))
    }

    pub fn installed(&self) -> &[(Window, Button)] {
        &self.installed
    }
}
