//! Turns bound button presses into window-manager requests.
//!
//! Nothing here is cached: the desktop counters, the active window and the
//! stacking order are read fresh for every press, so wheeldesk always acts
//! on whatever the window manager reports at that moment.

use crate::command::{Action, DesktopState, Message, StackEntry, Window};
use crate::traits::WindowSystem;
use log::{debug, info, trace};

/// Possible errors from the switcher.
#[derive(Debug, thiserror::Error)]
pub enum SwitcherError {
    /// The window system returned an error.
    #[error("window system error: {0}")]
    WindowSystem(String),
}

fn ws_err<E: std::error::Error>(e: E) -> SwitcherError {
    SwitcherError::WindowSystem(e.to_string())
}

/// Direction of a desktop switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopDirection {
    Up,
    Down,
}

/// Direction of a window cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Next,
    Prev,
}

/// The desktop to switch to, wrapping around at both ends.
///
/// Returns `None` when the window manager reports zero desktops; there is no
/// meaningful index to compute then.
pub fn next_desktop(state: DesktopState, dir: DesktopDirection) -> Option<u32> {
    let count = u64::from(state.count);
    let current = u64::from(state.current);
    let next = match dir {
        DesktopDirection::Up => (current + count).checked_sub(1)?.checked_rem(count)?,
        DesktopDirection::Down => (current + 1).checked_rem(count)?,
    };
    u32::try_from(next).ok()
}

/// Pick the window to bring forward.
///
/// Only windows on the active window's desktop qualify.  The stack is scanned
/// bottom to top: `Next` takes the first qualifying window that is not the
/// active one, `Prev` takes the last qualifying window seen before the
/// active one.  An active window missing from the stack, or without a
/// desktop, yields `None`.
pub fn select_cycle_target(
    stack: &[StackEntry],
    active: Window,
    dir: CycleDirection,
) -> Option<Window> {
    let desktop = stack.iter().find(|e| e.window == active)?.desktop?;
    let same_desktop = |e: &&StackEntry| e.desktop == Some(desktop);
    match dir {
        CycleDirection::Next => stack
            .iter()
            .filter(same_desktop)
            .map(|e| e.window)
            .find(|&w| w != active),
        CycleDirection::Prev => stack
            .iter()
            .take_while(|e| e.window != active)
            .filter(same_desktop)
            .last()
            .map(|e| e.window),
    }
}

/// The window directly beneath `active` in the stack, whatever its desktop.
pub fn window_beneath(stack: &[StackEntry], active: Window) -> Option<Window> {
    let i = stack.iter().position(|e| e.window == active)?;
    i.checked_sub(1).map(|below| stack[below].window)
}

/// Compute the requests for `action`, triggered by an event at `time`.
///
/// An empty result means the press is dropped.
pub fn handle<W: WindowSystem>(
    ws: &W,
    action: Action,
    time: u32,
) -> Result<Vec<Message>, SwitcherError> {
    match action {
        Action::DesktopUp => switch_desktop(ws, DesktopDirection::Up, time),
        Action::DesktopDown => switch_desktop(ws, DesktopDirection::Down, time),
        Action::WindowNext => cycle_window(ws, CycleDirection::Next, time),
        Action::WindowPrev => cycle_window(ws, CycleDirection::Prev, time),
    }
}

fn switch_desktop<W: WindowSystem>(
    ws: &W,
    dir: DesktopDirection,
    time: u32,
) -> Result<Vec<Message>, SwitcherError> {
    let Some(state) = ws.desktop_state().map_err(ws_err)? else {
        debug!("desktop properties missing, dropping {:?}", dir);
        return Ok(Vec::new());
    };
    let Some(desktop) = next_desktop(state, dir) else {
        debug!("window manager reports {} desktops, dropping {:?}", state.count, dir);
        return Ok(Vec::new());
    };
    info!("desktop {} -> {} of {}", state.current, desktop, state.count);
    Ok(vec![Message::SetCurrentDesktop { desktop, time }])
}

fn cycle_window<W: WindowSystem>(
    ws: &W,
    dir: CycleDirection,
    time: u32,
) -> Result<Vec<Message>, SwitcherError> {
    let Some(active) = ws.active_window().map_err(ws_err)? else {
        debug!("no active window, nothing to cycle");
        return Ok(Vec::new());
    };
    let stack = stacking_snapshot(ws)?;
    let Some(target) = select_cycle_target(&stack, active, dir) else {
        debug!("no window to cycle {:?} from 0x{:x}", dir, active);
        return Ok(Vec::new());
    };
    info!("cycle {:?}: 0x{:x} -> 0x{:x}", dir, active, target);

    let mut messages = Vec::with_capacity(2);
    if dir == CycleDirection::Next {
        if let Some(sibling) = window_beneath(&stack, active) {
            messages.push(Message::LowerWindow {
                window: active,
                sibling,
            });
        }
    }
    messages.push(Message::ActivateWindow {
        window: target,
        time,
        current_active: Some(active),
    });
    Ok(messages)
}

/// Stacking order paired with each window's desktop.
///
/// A window whose desktop cannot be read (typically one destroyed after the
/// list was fetched) is kept without a desktop and never qualifies.
fn stacking_snapshot<W: WindowSystem>(ws: &W) -> Result<Vec<StackEntry>, SwitcherError> {
    let order = ws.stacking_order().map_err(ws_err)?;
    Ok(order
        .into_iter()
        .map(|window| {
            let desktop = ws.window_desktop(window).unwrap_or_else(|e| {
                trace!("no desktop for 0x{:x}: {}", window, e);
                None
            });
            StackEntry { window, desktop }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSystem;

    const A: Window = 0xa;
    const B: Window = 0xb;
    const C: Window = 0xc;
    const D: Window = 0xd;

    fn state(current: u32, count: u32) -> DesktopState {
        DesktopState { current, count }
    }

    fn entries(stack: &[(Window, u32)]) -> Vec<StackEntry> {
        stack
            .iter()
            .map(|&(window, d)| StackEntry {
                window,
                desktop: Some(d),
            })
            .collect()
    }

    /// `[A(0, bottom), B(1), C(0), D(0, top)]`
    fn sample() -> Vec<StackEntry> {
        entries(&[(A, 0), (B, 1), (C, 0), (D, 0)])
    }

    //  Desktop arithmetic

    #[test]
    fn up_wraps_to_last_desktop() {
        assert_eq!(next_desktop(state(0, 4), DesktopDirection::Up), Some(3));
    }

    #[test]
    fn down_wraps_to_first_desktop() {
        assert_eq!(next_desktop(state(3, 4), DesktopDirection::Down), Some(0));
    }

    #[test]
    fn up_then_down_is_identity() {
        for count in 1..=9 {
            for current in 0..count {
                let s = state(current, count);
                let up = next_desktop(s, DesktopDirection::Up).unwrap();
                let back = next_desktop(state(up, count), DesktopDirection::Down).unwrap();
                assert_eq!(back, current, "count={count} current={current}");

                let down = next_desktop(s, DesktopDirection::Down).unwrap();
                let back = next_desktop(state(down, count), DesktopDirection::Up).unwrap();
                assert_eq!(back, current, "count={count} current={current}");
            }
        }
    }

    #[test]
    fn result_stays_in_range() {
        for count in 1..=6 {
            for current in 0..count {
                for dir in [DesktopDirection::Up, DesktopDirection::Down] {
                    let next = next_desktop(state(current, count), dir).unwrap();
                    assert!(next < count);
                }
            }
        }
    }

    #[test]
    fn single_desktop_stays_put() {
        assert_eq!(next_desktop(state(0, 1), DesktopDirection::Up), Some(0));
        assert_eq!(next_desktop(state(0, 1), DesktopDirection::Down), Some(0));
    }

    #[test]
    fn zero_desktops_yields_nothing() {
        assert_eq!(next_desktop(state(0, 0), DesktopDirection::Up), None);
        assert_eq!(next_desktop(state(0, 0), DesktopDirection::Down), None);
    }

    #[test]
    fn large_counters_do_not_overflow() {
        assert_eq!(
            next_desktop(state(u32::MAX - 1, u32::MAX), DesktopDirection::Down),
            Some(0)
        );
        assert_eq!(
            next_desktop(state(0, u32::MAX), DesktopDirection::Up),
            Some(u32::MAX - 1)
        );
    }

    //  Stacking selection

    #[test]
    fn next_selects_bottom_most_window_of_the_desktop() {
        assert_eq!(select_cycle_target(&sample(), D, CycleDirection::Next), Some(A));
    }

    #[test]
    fn prev_selects_window_beneath_active() {
        assert_eq!(select_cycle_target(&sample(), D, CycleDirection::Prev), Some(C));
    }

    #[test]
    fn other_desktops_are_ignored() {
        let stack = entries(&[(B, 1), (A, 0), (C, 1)]);
        assert_eq!(select_cycle_target(&stack, A, CycleDirection::Next), None);
        assert_eq!(select_cycle_target(&stack, A, CycleDirection::Prev), None);
    }

    #[test]
    fn active_missing_from_stack_is_noop() {
        assert_eq!(select_cycle_target(&sample(), 0x99, CycleDirection::Next), None);
        assert_eq!(select_cycle_target(&sample(), 0x99, CycleDirection::Prev), None);
    }

    #[test]
    fn active_without_desktop_is_noop() {
        let mut stack = sample();
        stack[3].desktop = None;
        assert_eq!(select_cycle_target(&stack, D, CycleDirection::Next), None);
    }

    #[test]
    fn prev_at_bottom_is_noop() {
        assert_eq!(select_cycle_target(&sample(), A, CycleDirection::Prev), None);
    }

    #[test]
    fn window_beneath_ignores_desktops() {
        assert_eq!(window_beneath(&sample(), D), Some(C));
        assert_eq!(window_beneath(&sample(), C), Some(B));
        assert_eq!(window_beneath(&sample(), A), None);
        assert_eq!(window_beneath(&sample(), 0x99), None);
    }

    /// Apply the requests to a model stack the way a window manager would.
    fn apply(stack: &mut Vec<StackEntry>, messages: &[Message]) {
        for m in messages {
            match *m {
                Message::LowerWindow { window, sibling } => {
                    let i = stack.iter().position(|e| e.window == window).unwrap();
                    let e = stack.remove(i);
                    let j = stack.iter().position(|e| e.window == sibling).unwrap();
                    stack.insert(j, e);
                }
                Message::ActivateWindow { window, .. } => {
                    let i = stack.iter().position(|e| e.window == window).unwrap();
                    let e = stack.remove(i);
                    stack.push(e);
                }
                Message::SetCurrentDesktop { .. } => unreachable!(),
            }
        }
    }

    fn windows(stack: &[StackEntry]) -> Vec<Window> {
        stack.iter().map(|e| e.window).collect()
    }

    #[test]
    fn next_lowers_active_one_level_then_raises_target() {
        let ws = FakeSystem::new().with_stack(&[(A, 0), (B, 1), (C, 0), (D, 0)], D);
        let mut stack = sample();
        apply(&mut stack, &handle(&ws, Action::WindowNext, 0).unwrap());
        assert_eq!(windows(&stack), vec![B, D, C, A]);
    }

    #[test]
    fn prev_raises_window_beneath_without_lowering() {
        let ws = FakeSystem::new().with_stack(&[(A, 0), (B, 1), (C, 0), (D, 0)], D);
        let mut stack = sample();
        apply(&mut stack, &handle(&ws, Action::WindowPrev, 0).unwrap());
        assert_eq!(windows(&stack), vec![A, B, D, C]);
    }

    #[test]
    fn unreadable_desktop_skips_only_that_window() {
        let mut ws = FakeSystem::new().with_stack(&[(A, 0), (B, 1), (C, 0), (D, 0)], D);
        ws.unreadable.insert(B);
        let msgs = handle(&ws, Action::WindowNext, 3).unwrap();
        assert_eq!(
            msgs.last(),
            Some(&Message::ActivateWindow {
                window: A,
                time: 3,
                current_active: Some(D),
            })
        );

        ws.unreadable.insert(A);
        let msgs = handle(&ws, Action::WindowNext, 3).unwrap();
        assert_eq!(
            msgs.last(),
            Some(&Message::ActivateWindow {
                window: C,
                time: 3,
                current_active: Some(D),
            })
        );
    }

    //  Messages

    #[test]
    fn desktop_down_message() {
        let ws = FakeSystem::new().with_desktops(1, 4);
        let msgs = handle(&ws, Action::DesktopDown, 77).unwrap();
        assert_eq!(msgs, vec![Message::SetCurrentDesktop { desktop: 2, time: 77 }]);
    }

    #[test]
    fn desktop_up_message() {
        let ws = FakeSystem::new().with_desktops(0, 4);
        let msgs = handle(&ws, Action::DesktopUp, 5).unwrap();
        assert_eq!(msgs, vec![Message::SetCurrentDesktop { desktop: 3, time: 5 }]);
    }

    #[test]
    fn missing_desktop_properties_drop_the_press() {
        let ws = FakeSystem::new();
        assert!(handle(&ws, Action::DesktopDown, 0).unwrap().is_empty());
    }

    #[test]
    fn zero_desktops_drop_the_press() {
        let ws = FakeSystem::new().with_desktops(0, 0);
        assert!(handle(&ws, Action::DesktopUp, 0).unwrap().is_empty());
    }

    #[test]
    fn next_lowers_active_then_activates_as_pager() {
        let ws = FakeSystem::new().with_stack(&[(A, 0), (B, 1), (C, 0), (D, 0)], D);
        let msgs = handle(&ws, Action::WindowNext, 9).unwrap();
        assert_eq!(
            msgs,
            vec![
                Message::LowerWindow {
                    window: D,
                    sibling: C,
                },
                Message::ActivateWindow {
                    window: A,
                    time: 9,
                    current_active: Some(D),
                },
            ]
        );
    }

    #[test]
    fn next_from_bottom_has_nothing_to_lower() {
        let ws = FakeSystem::new().with_stack(&[(A, 0), (B, 0)], A);
        let msgs = handle(&ws, Action::WindowNext, 9).unwrap();
        assert_eq!(
            msgs,
            vec![Message::ActivateWindow {
                window: B,
                time: 9,
                current_active: Some(A),
            }]
        );
    }

    #[test]
    fn prev_only_activates() {
        let ws = FakeSystem::new().with_stack(&[(A, 0), (B, 1), (C, 0), (D, 0)], D);
        let msgs = handle(&ws, Action::WindowPrev, 9).unwrap();
        assert_eq!(
            msgs,
            vec![Message::ActivateWindow {
                window: C,
                time: 9,
                current_active: Some(D),
            }]
        );
    }

    #[test]
    fn no_active_window_is_noop() {
        let ws = FakeSystem::new();
        assert!(handle(&ws, Action::WindowNext, 0).unwrap().is_empty());
        assert!(handle(&ws, Action::WindowPrev, 0).unwrap().is_empty());
    }
}
