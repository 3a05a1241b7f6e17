//! Integration tests for target bindings and key filters.
//!
//! Exercises the public API the way the redirector uses it: filters parsed
//! from user input, bound into a registry, and queried per key.

use keyroute_core::{
    parse_key, KeyAction, KeyFilter, KeyStateTracker, ProcessId, TargetBinding, TargetRegistry,
    WindowHandle,
};

#[test]
fn test_parsed_filter_drives_registry_matching() {
    let mut registry = TargetRegistry::new();
    let filter: KeyFilter = "h,l".parse().expect("filter must parse");
    registry.bind(TargetBinding::new(ProcessId(1), WindowHandle(0x10), filter));

    let h = parse_key("h").unwrap();
    let x = parse_key("x").unwrap();

    assert_eq!(registry.matching(h).count(), 1);
    assert_eq!(registry.matching(x).count(), 0);
}

#[test]
fn test_two_targets_with_same_key_both_match() {
    let mut registry = TargetRegistry::new();
    for (pid, hwnd) in [(1, 0x10), (2, 0x20)] {
        registry.bind(TargetBinding::new(
            ProcessId(pid),
            WindowHandle(hwnd),
            "h".parse().unwrap(),
        ));
    }

    let targets: Vec<ProcessId> = registry.matching(0x48).map(|b| b.process).collect();
    assert_eq!(targets, vec![ProcessId(1), ProcessId(2)]);
}

#[test]
fn test_rebinding_narrows_filter() {
    let mut registry = TargetRegistry::new();
    registry.bind(TargetBinding::new(ProcessId(7), WindowHandle(0x70), KeyFilter::all()));
    assert_eq!(registry.matching(0x58).count(), 1);

    registry.bind(TargetBinding::new(
        ProcessId(7),
        WindowHandle(0x70),
        "h".parse().unwrap(),
    ));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.matching(0x58).count(), 0);
    assert_eq!(registry.matching(0x48).count(), 1);
}

#[test]
fn test_key_state_tracks_named_key() {
    let mut tracker = KeyStateTracker::new();
    let a = parse_key("a").unwrap();

    tracker.apply(KeyAction::Down, a);
    assert!(tracker.get(a));
    tracker.apply(KeyAction::Up, a);
    assert!(!tracker.get(a));
}
