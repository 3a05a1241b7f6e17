//! Device classes and key actions.
//!
//! Both enums are closed sets with exhaustive mappings to the numeric tags the
//! Win32 hook and injection APIs expect. Keeping the numbers here (instead of
//! in the Windows adapter) lets the mapping be unit-tested on every host.

/// `WH_KEYBOARD_LL` hook identifier.
pub const HOOK_ID_KEYBOARD_LL: i32 = 13;
/// `WH_MOUSE_LL` hook identifier.
pub const HOOK_ID_MOUSE_LL: i32 = 14;

/// `INPUT_MOUSE` injection tag.
pub const INPUT_TYPE_MOUSE: u32 = 0;
/// `INPUT_KEYBOARD` injection tag.
pub const INPUT_TYPE_KEYBOARD: u32 = 1;
/// `INPUT_HARDWARE` injection tag.
pub const INPUT_TYPE_HARDWARE: u32 = 2;

/// Key-down carries no flag bits.
pub const EVENT_FLAGS_KEY_DOWN: u32 = 0x0000;
/// `KEYEVENTF_KEYUP`.
pub const EVENT_FLAGS_KEY_UP: u32 = 0x0002;

/// The input device whose events the redirector intercepts.
///
/// `Unset` is the initial value and the only one under which no hook may be
/// installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceClass {
    Keyboard,
    Mouse,
    #[default]
    Unset,
}

impl DeviceClass {
    /// Returns the low-level hook identifier for this device, or `None` for
    /// [`DeviceClass::Unset`].
    pub fn hook_id(self) -> Option<i32> {
        match self {
            DeviceClass::Keyboard => Some(HOOK_ID_KEYBOARD_LL),
            DeviceClass::Mouse => Some(HOOK_ID_MOUSE_LL),
            DeviceClass::Unset => None,
        }
    }

    /// Returns the `INPUT::type` tag used when injecting events of this class.
    pub fn input_type(self) -> u32 {
        match self {
            DeviceClass::Mouse => INPUT_TYPE_MOUSE,
            DeviceClass::Keyboard => INPUT_TYPE_KEYBOARD,
            DeviceClass::Unset => INPUT_TYPE_HARDWARE,
        }
    }

    /// `true` for every class except [`DeviceClass::Unset`].
    pub fn is_set(self) -> bool {
        self != DeviceClass::Unset
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceClass::Keyboard => "keyboard",
            DeviceClass::Mouse => "mouse",
            DeviceClass::Unset => "unset",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for DeviceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyboard" => Ok(DeviceClass::Keyboard),
            "mouse" => Ok(DeviceClass::Mouse),
            "unset" => Ok(DeviceClass::Unset),
            other => Err(format!("unknown device class '{other}'")),
        }
    }
}

/// What happened to a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Down,
    Up,
    /// Anything the hook reports that is neither a press nor a release
    /// (mouse moves, wheel ticks).
    Other,
}

impl KeyAction {
    /// Returns the `dwFlags` value for a keyboard injection of this action.
    ///
    /// `Other` has no injection equivalent and falls back to key-down.
    pub fn event_flags(self) -> u32 {
        match self {
            KeyAction::Up => EVENT_FLAGS_KEY_UP,
            KeyAction::Down | KeyAction::Other => EVENT_FLAGS_KEY_DOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_id_for_each_device_class() {
        assert_eq!(DeviceClass::Keyboard.hook_id(), Some(13));
        assert_eq!(DeviceClass::Mouse.hook_id(), Some(14));
        assert_eq!(DeviceClass::Unset.hook_id(), None);
    }

    #[test]
    fn test_input_type_orders_mouse_before_keyboard_before_other() {
        assert_eq!(DeviceClass::Mouse.input_type(), INPUT_TYPE_MOUSE);
        assert_eq!(DeviceClass::Keyboard.input_type(), INPUT_TYPE_KEYBOARD);
        assert_eq!(DeviceClass::Unset.input_type(), INPUT_TYPE_HARDWARE);
        assert!(DeviceClass::Mouse.input_type() < DeviceClass::Keyboard.input_type());
        assert!(DeviceClass::Keyboard.input_type() < DeviceClass::Unset.input_type());
    }

    #[test]
    fn test_default_device_class_is_unset() {
        assert_eq!(DeviceClass::default(), DeviceClass::Unset);
        assert!(!DeviceClass::default().is_set());
    }

    #[test]
    fn test_device_class_parses_case_insensitively() {
        assert_eq!("Keyboard".parse::<DeviceClass>(), Ok(DeviceClass::Keyboard));
        assert_eq!(" mouse ".parse::<DeviceClass>(), Ok(DeviceClass::Mouse));
        assert!("joystick".parse::<DeviceClass>().is_err());
    }

    #[test]
    fn test_device_class_display_round_trips_through_from_str() {
        for device in [DeviceClass::Keyboard, DeviceClass::Mouse, DeviceClass::Unset] {
            assert_eq!(device.to_string().parse::<DeviceClass>(), Ok(device));
        }
    }

    #[test]
    fn test_event_flags_map_up_to_keyup_and_everything_else_to_down() {
        assert_eq!(KeyAction::Down.event_flags(), EVENT_FLAGS_KEY_DOWN);
        assert_eq!(KeyAction::Up.event_flags(), EVENT_FLAGS_KEY_UP);
        assert_eq!(KeyAction::Other.event_flags(), EVENT_FLAGS_KEY_DOWN);
    }
}
