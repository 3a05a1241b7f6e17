//! Held-key mirror.
//!
//! [`KeyStateTracker`] records which virtual keys the redirector believes are
//! held down. It is a local mirror, not the OS's own key state: it only
//! changes when an event is actually forwarded to a target, so keys typed
//! while no binding matched never appear here.

use crate::domain::device::KeyAction;

/// Number of addressable virtual-key codes (0x00–0xFF).
pub const KEY_COUNT: usize = 256;

/// Fixed table of 256 "held" flags indexed by virtual-key code.
#[derive(Debug, Clone)]
pub struct KeyStateTracker {
    held: [bool; KEY_COUNT],
}

impl KeyStateTracker {
    /// Creates a tracker with every key released.
    pub fn new() -> Self {
        Self {
            held: [false; KEY_COUNT],
        }
    }

    /// Returns whether `code` is currently held.
    ///
    /// Codes outside `0..=255` are never held.
    pub fn get(&self, code: u32) -> bool {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.held.get(idx))
            .copied()
            .unwrap_or(false)
    }

    /// Applies a forwarded event: `Down` marks the key held, `Up` releases it.
    ///
    /// `Other` actions and out-of-range codes leave the table untouched.
    pub fn apply(&mut self, action: KeyAction, code: u32) {
        let Some(slot) = usize::try_from(code)
            .ok()
            .and_then(|idx| self.held.get_mut(idx))
        else {
            return;
        };
        match action {
            KeyAction::Down => *slot = true,
            KeyAction::Up => *slot = false,
            KeyAction::Other => {}
        }
    }
}

impl Default for KeyStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker_has_no_held_keys() {
        let tracker = KeyStateTracker::new();
        assert!((0..KEY_COUNT as u32).all(|c| !tracker.get(c)));
    }

    #[test]
    fn test_down_then_up_toggles_every_code_in_range() {
        let mut tracker = KeyStateTracker::new();
        for code in 0..KEY_COUNT as u32 {
            tracker.apply(KeyAction::Down, code);
            assert!(tracker.get(code), "code {code:#04x} should be held after Down");
            tracker.apply(KeyAction::Up, code);
            assert!(!tracker.get(code), "code {code:#04x} should be released after Up");
        }
    }

    #[test]
    fn test_out_of_range_codes_are_ignored_and_read_false() {
        let mut tracker = KeyStateTracker::new();
        for code in [256, 0x1_0000, u32::MAX] {
            tracker.apply(KeyAction::Down, code);
            assert!(!tracker.get(code));
        }
        assert!((0..KEY_COUNT as u32).all(|c| !tracker.get(c)));
    }

    #[test]
    fn test_other_action_does_not_change_state() {
        let mut tracker = KeyStateTracker::new();
        tracker.apply(KeyAction::Down, 0x41);
        tracker.apply(KeyAction::Other, 0x41);
        assert!(tracker.get(0x41));
    }
}
