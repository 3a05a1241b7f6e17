//! Target bindings.
//!
//! A [`TargetBinding`] ties a destination process (and the main window that
//! receives its synthetic input) to a [`KeyFilter`]. The [`TargetRegistry`]
//! holds every active binding, keyed by process identity.
//!
//! # Fan-out
//!
//! Several bindings may match the same key; each matching binding receives
//! its own copy of the event. Registration order is preserved so that the
//! order of injections is deterministic.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::keymap::{key_name, parse_key, KeyParseError};

/// OS process identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque top-level window handle.
///
/// Stored as an integer so it can cross threads freely; the Windows adapter
/// converts it back into an `HWND` at the API boundary. Zero is never a
/// usable window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The set of virtual-key codes a target wants to receive.
///
/// An empty filter matches every key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFilter {
    codes: BTreeSet<u32>,
}

impl KeyFilter {
    /// A filter that matches every key.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self.codes.is_empty()
    }

    /// Returns `true` if this filter admits `code`.
    pub fn matches(&self, code: u32) -> bool {
        self.codes.is_empty() || self.codes.contains(&code)
    }

    pub fn codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.codes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl FromIterator<u32> for KeyFilter {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().collect(),
        }
    }
}

/// Parses a comma-separated list of key names or hex codes, e.g. `"h,l,0x1b"`.
///
/// An empty or all-whitespace string yields the match-all filter.
impl FromStr for KeyFilter {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(parse_key)
            .collect()
    }
}

impl fmt::Display for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.codes.is_empty() {
            return f.write_str("*");
        }
        let names: Vec<String> = self.codes.iter().map(|&c| key_name(c)).collect();
        f.write_str(&names.join(","))
    }
}

/// One destination for redirected input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetBinding {
    pub process: ProcessId,
    pub window: WindowHandle,
    pub filter: KeyFilter,
}

impl TargetBinding {
    pub fn new(process: ProcessId, window: WindowHandle, filter: KeyFilter) -> Self {
        Self {
            process,
            window,
            filter,
        }
    }
}

/// Every active binding, keyed by process identity.
///
/// Lookups are linear scans; filters are expected to be small and the number
/// of simultaneous targets in the single digits.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    bindings: Vec<TargetBinding>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `binding`, replacing any existing binding for the same process.
    ///
    /// A replaced binding keeps its original position in the fan-out order.
    /// Returns `true` if an existing binding was replaced.
    pub fn bind(&mut self, binding: TargetBinding) -> bool {
        match self
            .bindings
            .iter_mut()
            .find(|b| b.process == binding.process)
        {
            Some(existing) => {
                *existing = binding;
                true
            }
            None => {
                self.bindings.push(binding);
                false
            }
        }
    }

    /// Returns every binding whose filter admits `code`, in registration order.
    pub fn matching(&self, code: u32) -> impl Iterator<Item = &TargetBinding> + '_ {
        self.bindings.iter().filter(move |b| b.filter.matches(code))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetBinding> + '_ {
        self.bindings.iter()
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(pid: u32, hwnd: isize, keys: &[u32]) -> TargetBinding {
        TargetBinding::new(
            ProcessId(pid),
            WindowHandle(hwnd),
            keys.iter().copied().collect(),
        )
    }

    #[test]
    fn test_empty_filter_matches_every_code() {
        let filter = KeyFilter::all();
        assert!(filter.is_match_all());
        assert!(filter.matches(0x00));
        assert!(filter.matches(0x41));
        assert!(filter.matches(0x1_0000));
    }

    #[test]
    fn test_non_empty_filter_matches_only_its_codes() {
        let filter: KeyFilter = [0x48, 0x4C].into_iter().collect();
        assert!(filter.matches(0x48));
        assert!(filter.matches(0x4C));
        assert!(!filter.matches(0x58));
    }

    #[test]
    fn test_filter_parses_names_and_hex_codes() {
        let filter: KeyFilter = "h, l ,0x1b".parse().unwrap();
        assert_eq!(filter.codes().collect::<Vec<_>>(), vec![0x1B, 0x48, 0x4C]);
    }

    #[test]
    fn test_filter_parses_empty_string_as_match_all() {
        let filter: KeyFilter = "".parse().unwrap();
        assert!(filter.is_match_all());
        let filter: KeyFilter = " , ".parse().unwrap();
        assert!(filter.is_match_all());
    }

    #[test]
    fn test_filter_rejects_unknown_key_name() {
        let err = "h,bogus".parse::<KeyFilter>().unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_filter_display_uses_key_names() {
        let filter: KeyFilter = [0x48, 0x4C].into_iter().collect();
        assert_eq!(filter.to_string(), "H,L");
        assert_eq!(KeyFilter::all().to_string(), "*");
    }

    #[test]
    fn test_window_handle_null() {
        assert!(WindowHandle::NULL.is_null());
        assert!(!WindowHandle(0x1234).is_null());
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = TargetRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.matching(0x41).count(), 0);
    }

    #[test]
    fn test_bind_same_process_replaces_instead_of_duplicating() {
        let mut registry = TargetRegistry::new();
        assert!(!registry.bind(binding(10, 0x100, &[0x48])));
        assert!(registry.bind(binding(10, 0x100, &[0x4C])));

        assert_eq!(registry.len(), 1);
        let b = registry.iter().next().unwrap();
        assert!(b.filter.matches(0x4C));
        assert!(!b.filter.matches(0x48));
    }

    #[test]
    fn test_replaced_binding_keeps_fan_out_position() {
        let mut registry = TargetRegistry::new();
        registry.bind(binding(1, 0x100, &[]));
        registry.bind(binding(2, 0x200, &[]));
        registry.bind(binding(1, 0x101, &[]));

        let order: Vec<u32> = registry.iter().map(|b| b.process.0).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(registry.iter().next().unwrap().window, WindowHandle(0x101));
    }

    #[test]
    fn test_matching_fans_out_to_every_admitting_binding() {
        let mut registry = TargetRegistry::new();
        registry.bind(binding(1, 0x100, &[0x48]));
        registry.bind(binding(2, 0x200, &[0x48]));
        registry.bind(binding(3, 0x300, &[0x4C]));
        registry.bind(binding(4, 0x400, &[]));

        let windows: Vec<WindowHandle> = registry.matching(0x48).map(|b| b.window).collect();
        assert_eq!(
            windows,
            vec![WindowHandle(0x100), WindowHandle(0x200), WindowHandle(0x400)]
        );
    }

    #[test]
    fn test_clear_removes_every_binding() {
        let mut registry = TargetRegistry::new();
        registry.bind(binding(1, 0x100, &[]));
        registry.bind(binding(2, 0x200, &[]));
        registry.clear();
        assert!(registry.is_empty());
    }
}
