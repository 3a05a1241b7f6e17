//! Synthetic input construction and submission.
//!
//! The OS injection primitive has no notion of a destination window: it
//! delivers to whatever window has focus. Directing an event at a target is
//! therefore a two-step operation: foreground the target window, then inject
//! one input descriptor.

use std::sync::Arc;

use keyroute_core::{key_name, DeviceClass, KeyAction, SyntheticEvent, WindowHandle};
use tracing::trace;

/// Boundary to the OS input-injection subsystem.
///
/// Both calls are fire-and-forget: failures are not observable to callers.
pub trait InputInjector: Send + Sync {
    /// Gives keyboard focus to `window`.
    fn bring_to_foreground(&self, window: WindowHandle);

    /// Submits exactly one input descriptor to the focused window.
    fn inject(&self, event: &SyntheticEvent);
}

/// Builds [`SyntheticEvent`]s and delivers them to target windows.
pub struct SyntheticInputBuilder {
    injector: Arc<dyn InputInjector>,
}

impl SyntheticInputBuilder {
    pub fn new(injector: Arc<dyn InputInjector>) -> Self {
        Self { injector }
    }

    /// Builds the descriptor for a logical `(device, action, vk_code)` triple.
    ///
    /// Scan code and extra info are always zero.
    pub fn build(device: DeviceClass, action: KeyAction, vk_code: u32) -> SyntheticEvent {
        SyntheticEvent::new(device, action, vk_code)
    }

    /// Foregrounds `window` and injects one synthetic event.
    ///
    /// Returns the descriptor that was submitted.
    pub fn send(
        &self,
        device: DeviceClass,
        action: KeyAction,
        vk_code: u32,
        window: WindowHandle,
    ) -> SyntheticEvent {
        let event = Self::build(device, action, vk_code);
        self.injector.bring_to_foreground(window);
        self.injector.inject(&event);
        trace!(
            %window,
            key = %key_name(vk_code),
            ?action,
            "synthetic event injected"
        );
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyroute_core::domain::device::{
        EVENT_FLAGS_KEY_DOWN, EVENT_FLAGS_KEY_UP, INPUT_TYPE_KEYBOARD, INPUT_TYPE_MOUSE,
    };
    use std::sync::Mutex;

    // ── Test double ───────────────────────────────────────────────────────────

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Foreground(WindowHandle),
        Inject(SyntheticEvent),
    }

    #[derive(Default)]
    struct RecordingInjector {
        calls: Mutex<Vec<Call>>,
    }

    impl InputInjector for RecordingInjector {
        fn bring_to_foreground(&self, window: WindowHandle) {
            self.calls.lock().unwrap().push(Call::Foreground(window));
        }

        fn inject(&self, event: &SyntheticEvent) {
            self.calls.lock().unwrap().push(Call::Inject(*event));
        }
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_build_keyboard_down_uses_keyboard_tag_and_down_flags() {
        let event = SyntheticInputBuilder::build(DeviceClass::Keyboard, KeyAction::Down, 0x41);

        assert_eq!(event.input_type(), INPUT_TYPE_KEYBOARD);
        assert_eq!(event.event_flags(), EVENT_FLAGS_KEY_DOWN);
        assert_eq!(event.scan_code, 0);
        assert_eq!(event.extra_info, 0);
    }

    #[test]
    fn test_build_mouse_up_uses_mouse_tag_and_up_flags() {
        let event = SyntheticInputBuilder::build(DeviceClass::Mouse, KeyAction::Up, 0x01);

        assert_eq!(event.input_type(), INPUT_TYPE_MOUSE);
        assert_eq!(event.event_flags(), EVENT_FLAGS_KEY_UP);
    }

    #[test]
    fn test_build_other_action_defaults_to_down_flags() {
        let event = SyntheticInputBuilder::build(DeviceClass::Keyboard, KeyAction::Other, 0x41);

        assert_eq!(event.event_flags(), EVENT_FLAGS_KEY_DOWN);
    }

    #[test]
    fn test_send_foregrounds_before_injecting_once() {
        // Arrange
        let injector = Arc::new(RecordingInjector::default());
        let builder = SyntheticInputBuilder::new(injector.clone());

        // Act
        let sent = builder.send(DeviceClass::Keyboard, KeyAction::Down, 0x48, WindowHandle(0x99));

        // Assert
        let calls = injector.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![Call::Foreground(WindowHandle(0x99)), Call::Inject(sent)]
        );
        assert_eq!(sent.vk_code, 0x48);
    }
}
