//! Event classification: the per-event decision run inside the hook callback.
//!
//! # How classification works (for beginners)
//!
//! The OS calls our hook for every keyboard (or mouse) event on the system.
//! For each one the classifier answers two independent questions:
//!
//! 1. **What should the engine do?**  ([`Classification`])
//!    - `Escape`  – the user pressed the escape key; disarm the hook.
//!    - `Forward` – one or more targets want this key; synthesize a copy for
//!      each of their windows.
//!    - `Ignore`  – nothing to do.
//!
//! 2. **Should the original event continue to the focused app?**
//!    ([`HookVerdict`])  Decided by the [`PassThroughPolicy`].
//!
//! The classifier is pure: it reads a snapshot of the device class and the
//! registry and returns a value. All side effects (injection, key-state
//! updates, disengaging) are performed by the engine afterwards.

use keyroute_core::{DeviceClass, KeyAction, TargetRegistry, WindowHandle, VK_ESCAPE};

/// Hook code the OS uses for a normal, actionable event (`HC_ACTION`).
pub const HOOK_CODE_ACTION: i32 = 0;

/// A raw event as delivered by the OS hook, already decoded by the platform
/// adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHookEvent {
    /// Hook code; negative means "not actionable, pass it on".
    pub code: i32,
    pub action: KeyAction,
    pub vk_code: u32,
    /// Set when the OS flags the event as injected (possibly by us).
    pub injected: bool,
}

impl RawHookEvent {
    /// An actionable, hardware-originated event.
    pub fn new(action: KeyAction, vk_code: u32) -> Self {
        Self {
            code: HOOK_CODE_ACTION,
            action,
            vk_code,
            injected: false,
        }
    }

    pub fn down(vk_code: u32) -> Self {
        Self::new(KeyAction::Down, vk_code)
    }

    pub fn up(vk_code: u32) -> Self {
        Self::new(KeyAction::Up, vk_code)
    }
}

/// What the hook callback tells the OS about the original event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookVerdict {
    /// Call the next hook; the focused application receives the event.
    PassThrough,
    /// Swallow the event.
    Suppress,
}

/// Whether unmatched and forwarded events continue down the hook chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassThroughPolicy {
    /// Swallow every actionable event while at least one target is bound.
    #[default]
    SuppressWhileBound,
    /// Let every event through; targets receive copies.
    PassThrough,
}

/// The engine's action for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Ignore,
    Escape,
    /// Windows to receive a synthetic copy, in registration order.
    Forward(Vec<WindowHandle>),
}

/// Decides what happens to each hooked event.
#[derive(Debug, Clone, Copy)]
pub struct EventClassifier {
    escape_vk: u32,
    policy: PassThroughPolicy,
}

impl EventClassifier {
    pub fn new(escape_vk: u32, policy: PassThroughPolicy) -> Self {
        Self { escape_vk, policy }
    }

    pub fn escape_vk(&self) -> u32 {
        self.escape_vk
    }

    pub fn policy(&self) -> PassThroughPolicy {
        self.policy
    }

    /// Classifies `event` against the active device class and bindings.
    pub fn classify(
        &self,
        event: &RawHookEvent,
        device: DeviceClass,
        registry: &TargetRegistry,
    ) -> Classification {
        if event.code < 0 || event.injected {
            return Classification::Ignore;
        }

        if device == DeviceClass::Keyboard
            && event.action == KeyAction::Down
            && event.vk_code == self.escape_vk
        {
            return Classification::Escape;
        }

        let windows: Vec<WindowHandle> = registry
            .matching(event.vk_code)
            .map(|binding| binding.window)
            .collect();

        if windows.is_empty() {
            Classification::Ignore
        } else {
            Classification::Forward(windows)
        }
    }

    /// Decides whether the original event continues down the hook chain.
    ///
    /// `bound` is whether the registry was non-empty when the event was
    /// classified.
    pub fn verdict(
        &self,
        event: &RawHookEvent,
        classification: &Classification,
        bound: bool,
    ) -> HookVerdict {
        if event.code < 0 || event.injected {
            return HookVerdict::PassThrough;
        }
        if *classification == Classification::Escape {
            return HookVerdict::Suppress;
        }
        match self.policy {
            PassThroughPolicy::SuppressWhileBound if bound => HookVerdict::Suppress,
            _ => HookVerdict::PassThrough,
        }
    }
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(VK_ESCAPE, PassThroughPolicy::default())
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use keyroute_core::{KeyFilter, ProcessId, TargetBinding};

    const VK_H: u32 = 0x48;
    const VK_L: u32 = 0x4C;
    const VK_X: u32 = 0x58;

    fn registry_with(bindings: &[(u32, isize, &[u32])]) -> TargetRegistry {
        let mut registry = TargetRegistry::new();
        for &(pid, hwnd, codes) in bindings {
            registry.bind(TargetBinding::new(
                ProcessId(pid),
                WindowHandle(hwnd),
                codes.iter().copied().collect::<KeyFilter>(),
            ));
        }
        registry
    }

    #[test]
    fn test_negative_code_is_ignored_and_passed_through() {
        // Arrange
        let classifier = EventClassifier::default();
        let registry = registry_with(&[(1, 0x10, &[])]);
        let event = RawHookEvent {
            code: -1,
            ..RawHookEvent::down(VK_H)
        };

        // Act
        let class = classifier.classify(&event, DeviceClass::Keyboard, &registry);
        let verdict = classifier.verdict(&event, &class, true);

        // Assert
        assert_eq!(class, Classification::Ignore);
        assert_eq!(verdict, HookVerdict::PassThrough);
    }

    #[test]
    fn test_escape_down_on_keyboard_is_escape_and_suppressed() {
        let classifier = EventClassifier::default();
        let registry = registry_with(&[(1, 0x10, &[])]);
        let event = RawHookEvent::down(VK_ESCAPE);

        let class = classifier.classify(&event, DeviceClass::Keyboard, &registry);

        assert_eq!(class, Classification::Escape);
        assert_eq!(
            classifier.verdict(&event, &class, true),
            HookVerdict::Suppress
        );
    }

    #[test]
    fn test_escape_up_is_forwarded_not_escape() {
        let classifier = EventClassifier::default();
        let registry = registry_with(&[(1, 0x10, &[])]);

        let class = classifier.classify(
            &RawHookEvent::up(VK_ESCAPE),
            DeviceClass::Keyboard,
            &registry,
        );

        assert_eq!(class, Classification::Forward(vec![WindowHandle(0x10)]));
    }

    #[test]
    fn test_escape_code_on_mouse_device_is_not_escape() {
        let classifier = EventClassifier::default();
        let registry = TargetRegistry::new();

        let class = classifier.classify(
            &RawHookEvent::down(VK_ESCAPE),
            DeviceClass::Mouse,
            &registry,
        );

        assert_eq!(class, Classification::Ignore);
    }

    #[test]
    fn test_custom_escape_key_replaces_default() {
        let classifier = EventClassifier::new(VK_X, PassThroughPolicy::default());
        let registry = registry_with(&[(1, 0x10, &[])]);

        let escape = classifier.classify(&RawHookEvent::down(VK_X), DeviceClass::Keyboard, &registry);
        let esc_key = classifier.classify(
            &RawHookEvent::down(VK_ESCAPE),
            DeviceClass::Keyboard,
            &registry,
        );

        assert_eq!(escape, Classification::Escape);
        assert_eq!(esc_key, Classification::Forward(vec![WindowHandle(0x10)]));
    }

    #[test]
    fn test_filter_admits_listed_key_only() {
        let classifier = EventClassifier::default();
        let registry = registry_with(&[(1, 0x10, &[VK_H, VK_L])]);

        let h = classifier.classify(&RawHookEvent::down(VK_H), DeviceClass::Keyboard, &registry);
        let x = classifier.classify(&RawHookEvent::down(VK_X), DeviceClass::Keyboard, &registry);

        assert_eq!(h, Classification::Forward(vec![WindowHandle(0x10)]));
        assert_eq!(x, Classification::Ignore);
    }

    #[test]
    fn test_fan_out_preserves_registration_order() {
        let classifier = EventClassifier::default();
        let registry = registry_with(&[(2, 0x20, &[VK_H]), (1, 0x10, &[VK_H]), (3, 0x30, &[VK_L])]);

        let class = classifier.classify(&RawHookEvent::down(VK_H), DeviceClass::Keyboard, &registry);

        assert_eq!(
            class,
            Classification::Forward(vec![WindowHandle(0x20), WindowHandle(0x10)])
        );
    }

    #[test]
    fn test_injected_event_is_ignored_and_passed_through() {
        let classifier = EventClassifier::default();
        let registry = registry_with(&[(1, 0x10, &[])]);
        let event = RawHookEvent {
            injected: true,
            ..RawHookEvent::down(VK_ESCAPE)
        };

        let class = classifier.classify(&event, DeviceClass::Keyboard, &registry);

        assert_eq!(class, Classification::Ignore);
        assert_eq!(
            classifier.verdict(&event, &class, true),
            HookVerdict::PassThrough
        );
    }

    #[test]
    fn test_suppress_while_bound_swallows_unmatched_events() {
        let classifier = EventClassifier::default();
        let event = RawHookEvent::down(VK_X);

        assert_eq!(
            classifier.verdict(&event, &Classification::Ignore, true),
            HookVerdict::Suppress
        );
        assert_eq!(
            classifier.verdict(&event, &Classification::Ignore, false),
            HookVerdict::PassThrough
        );
    }

    #[test]
    fn test_pass_through_policy_lets_forwarded_events_continue() {
        let classifier = EventClassifier::new(VK_ESCAPE, PassThroughPolicy::PassThrough);
        let event = RawHookEvent::down(VK_H);
        let class = Classification::Forward(vec![WindowHandle(0x10)]);

        assert_eq!(
            classifier.verdict(&event, &class, true),
            HookVerdict::PassThrough
        );
    }

    #[test]
    fn test_pass_through_policy_still_suppresses_escape() {
        let classifier = EventClassifier::new(VK_ESCAPE, PassThroughPolicy::PassThrough);
        let event = RawHookEvent::down(VK_ESCAPE);

        assert_eq!(
            classifier.verdict(&event, &Classification::Escape, true),
            HookVerdict::Suppress
        );
    }

    #[test]
    fn test_other_action_is_forwarded_when_filter_matches() {
        let classifier = EventClassifier::default();
        let registry = registry_with(&[(1, 0x10, &[])]);
        let event = RawHookEvent::new(KeyAction::Other, 0);

        let class = classifier.classify(&event, DeviceClass::Mouse, &registry);

        assert_eq!(class, Classification::Forward(vec![WindowHandle(0x10)]));
    }
}
