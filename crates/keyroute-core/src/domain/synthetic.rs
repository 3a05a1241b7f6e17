//! Synthetic input descriptor.

use crate::domain::device::{DeviceClass, KeyAction};

/// A fabricated input event, fully described and ready for injection.
///
/// `scan_code` and `extra_info` are always zero: the redirector forwards
/// logical keys only and makes no attempt at hardware-accurate scan codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticEvent {
    pub device: DeviceClass,
    pub action: KeyAction,
    pub vk_code: u32,
    pub scan_code: u16,
    pub extra_info: usize,
}

impl SyntheticEvent {
    pub fn new(device: DeviceClass, action: KeyAction, vk_code: u32) -> Self {
        Self {
            device,
            action,
            vk_code,
            scan_code: 0,
            extra_info: 0,
        }
    }

    /// `INPUT::type` tag for this event's device class.
    pub fn input_type(&self) -> u32 {
        self.device.input_type()
    }

    /// `dwFlags` for this event's action.
    pub fn event_flags(&self) -> u32 {
        self.action.event_flags()
    }
}
