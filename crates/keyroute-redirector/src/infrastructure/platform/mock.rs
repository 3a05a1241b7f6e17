//! In-memory platform for tests and dry runs.
//!
//! # Why a mock platform?
//!
//! The Win32 adapters install a real system-wide hook and type into real
//! windows. None of that is observable (or safe) from test code. The types
//! here replace every OS call with in-memory recording:
//!
//! - [`MockHookInstaller`] keeps the registered sink in a single slot, like
//!   the OS does for our one hook, and lets tests play the OS by calling
//!   [`MockHookInstaller::deliver`].
//! - [`MockInputInjector`] records foreground switches and injections in the
//!   order they happened.
//! - [`MockWindowDirectory`] is a process → window table.
//!
//! # Usage in tests
//!
//! ```ignore
//! let platform = MockPlatform::new();
//! platform.windows.add(ProcessId(1), WindowHandle(0x10));
//! let engine = RedirectEngine::new(platform.installer.clone(), /* … */);
//!
//! engine.configure(DeviceClass::Keyboard);
//! engine.bind_process(ProcessId(1), KeyFilter::all())?;
//! engine.engage()?;
//!
//! platform.installer.deliver(RawHookEvent::down(0x41));
//! assert_eq!(platform.injector.injected().len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keyroute_core::{DeviceClass, ProcessId, SyntheticEvent, WindowHandle};

use crate::application::classify::{HookVerdict, RawHookEvent};
use crate::application::engine::{HookError, HookHandle, HookInstaller, HookSink, WindowDirectory};
use crate::application::synthesize::InputInjector;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Hook installer ────────────────────────────────────────────────────────────

/// Single-slot hook installer that records every install and removal.
pub struct MockHookInstaller {
    sink: Mutex<Option<(HookHandle, Arc<dyn HookSink>)>>,
    next_handle: AtomicIsize,
    /// Device class of every successful install, in order.
    pub installs: Mutex<Vec<DeviceClass>>,
    /// Handle of every `remove` call, in order (including failed ones).
    pub removals: Mutex<Vec<HookHandle>>,
    /// When set, `install` fails with `InstallRejected`.
    pub fail_install: AtomicBool,
    /// When set, `remove` reports `RemoveFailed`. The sink is dropped anyway,
    /// as a best-effort OS would.
    pub fail_remove: AtomicBool,
}

impl MockHookInstaller {
    pub fn new() -> Self {
        Self {
            sink: Mutex::new(None),
            next_handle: AtomicIsize::new(1),
            installs: Mutex::new(Vec::new()),
            removals: Mutex::new(Vec::new()),
            fail_install: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    /// Plays the OS: hands `event` to the installed sink.
    ///
    /// With no hook installed the event passes through untouched.
    pub fn deliver(&self, event: RawHookEvent) -> HookVerdict {
        let sink = lock(&self.sink).as_ref().map(|(_, sink)| Arc::clone(sink));
        match sink {
            Some(sink) => sink.on_event(event),
            None => HookVerdict::PassThrough,
        }
    }

    /// Number of hooks currently installed (0 or 1).
    pub fn active_hooks(&self) -> usize {
        usize::from(lock(&self.sink).is_some())
    }

    pub fn set_fail_install(&self, fail: bool) {
        self.fail_install.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockHookInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl HookInstaller for MockHookInstaller {
    fn install(
        &self,
        device: DeviceClass,
        sink: Arc<dyn HookSink>,
    ) -> Result<HookHandle, HookError> {
        if self.fail_install.load(Ordering::SeqCst) {
            return Err(HookError::InstallRejected("mock install failure".into()));
        }
        if !device.is_set() {
            return Err(HookError::InstallRejected("device class is unset".into()));
        }

        let mut slot = lock(&self.sink);
        if slot.is_some() {
            return Err(HookError::AlreadyInstalled);
        }
        let handle = HookHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        *slot = Some((handle, sink));
        lock(&self.installs).push(device);
        Ok(handle)
    }

    fn remove(&self, handle: HookHandle) -> Result<(), HookError> {
        lock(&self.removals).push(handle);

        // Drop the sink outside the slot lock: it may be the last reference
        // to the engine.
        let removed = {
            let mut slot = lock(&self.sink);
            match slot.as_ref() {
                Some((active, _)) if *active == handle => slot.take(),
                _ => None,
            }
        };

        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(HookError::RemoveFailed("mock remove failure".into()));
        }
        match removed {
            Some(_) => Ok(()),
            None => Err(HookError::RemoveFailed(format!(
                "hook {} is not installed",
                handle.0
            ))),
        }
    }
}

// ── Input injector ────────────────────────────────────────────────────────────

/// One recorded call on [`MockInputInjector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectorCall {
    Foreground(WindowHandle),
    Inject(SyntheticEvent),
}

/// Records foreground switches and injections in call order.
#[derive(Default)]
pub struct MockInputInjector {
    pub calls: Mutex<Vec<InjectorCall>>,
}

impl MockInputInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every injected event, in order.
    pub fn injected(&self) -> Vec<SyntheticEvent> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                InjectorCall::Inject(event) => Some(*event),
                InjectorCall::Foreground(_) => None,
            })
            .collect()
    }

    /// Every injected event paired with the window that was foreground when
    /// it was submitted. Events injected before any foreground switch are
    /// omitted.
    pub fn deliveries(&self) -> Vec<(WindowHandle, SyntheticEvent)> {
        let mut focused = None;
        let mut out = Vec::new();
        for call in lock(&self.calls).iter() {
            match *call {
                InjectorCall::Foreground(window) => focused = Some(window),
                InjectorCall::Inject(event) => {
                    if let Some(window) = focused {
                        out.push((window, event));
                    }
                }
            }
        }
        out
    }

    pub fn foregrounded(&self) -> Vec<WindowHandle> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                InjectorCall::Foreground(window) => Some(*window),
                InjectorCall::Inject(_) => None,
            })
            .collect()
    }
}

impl InputInjector for MockInputInjector {
    fn bring_to_foreground(&self, window: WindowHandle) {
        lock(&self.calls).push(InjectorCall::Foreground(window));
    }

    fn inject(&self, event: &SyntheticEvent) {
        lock(&self.calls).push(InjectorCall::Inject(*event));
    }
}

// ── Window directory ──────────────────────────────────────────────────────────

/// Process → main window table.
#[derive(Default)]
pub struct MockWindowDirectory {
    windows: Mutex<HashMap<ProcessId, WindowHandle>>,
}

impl MockWindowDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, process: ProcessId, window: WindowHandle) {
        lock(&self.windows).insert(process, window);
    }

    /// Simulates the process exiting: its window stops existing.
    pub fn remove(&self, process: ProcessId) {
        lock(&self.windows).remove(&process);
    }
}

impl WindowDirectory for MockWindowDirectory {
    fn is_window(&self, window: WindowHandle) -> bool {
        !window.is_null() && lock(&self.windows).values().any(|w| *w == window)
    }

    fn main_window(&self, process: ProcessId) -> Option<WindowHandle> {
        lock(&self.windows).get(&process).copied()
    }

    fn owner(&self, window: WindowHandle) -> Option<ProcessId> {
        lock(&self.windows)
            .iter()
            .find(|(_, w)| **w == window)
            .map(|(process, _)| *process)
    }
}

// ── Bundle ────────────────────────────────────────────────────────────────────

/// The three mocks, shared so tests can keep a typed handle on each.
#[derive(Clone, Default)]
pub struct MockPlatform {
    pub installer: Arc<MockHookInstaller>,
    pub injector: Arc<MockInputInjector>,
    pub windows: Arc<MockWindowDirectory>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSink(Mutex<u32>);

    impl HookSink for CountingSink {
        fn on_event(&self, _event: RawHookEvent) -> HookVerdict {
            *self.0.lock().unwrap() += 1;
            HookVerdict::Suppress
        }
    }

    #[test]
    fn test_second_install_is_rejected_while_slot_is_taken() {
        let installer = MockHookInstaller::new();
        let sink = Arc::new(CountingSink(Mutex::new(0)));

        installer.install(DeviceClass::Keyboard, sink.clone()).unwrap();
        let second = installer.install(DeviceClass::Mouse, sink);

        assert!(matches!(second, Err(HookError::AlreadyInstalled)));
        assert_eq!(installer.active_hooks(), 1);
    }

    #[test]
    fn test_deliver_reaches_sink_until_removed() {
        let installer = MockHookInstaller::new();
        let sink = Arc::new(CountingSink(Mutex::new(0)));
        let handle = installer.install(DeviceClass::Keyboard, sink.clone()).unwrap();

        let hooked = installer.deliver(RawHookEvent::down(0x41));
        installer.remove(handle).unwrap();
        let unhooked = installer.deliver(RawHookEvent::down(0x41));

        assert_eq!(hooked, HookVerdict::Suppress);
        assert_eq!(unhooked, HookVerdict::PassThrough);
        assert_eq!(*sink.0.lock().unwrap(), 1);
    }

    #[test]
    fn test_remove_failure_still_drops_the_hook() {
        let installer = MockHookInstaller::new();
        let sink = Arc::new(CountingSink(Mutex::new(0)));
        let handle = installer.install(DeviceClass::Keyboard, sink).unwrap();
        installer.set_fail_remove(true);

        let result = installer.remove(handle);

        assert!(matches!(result, Err(HookError::RemoveFailed(_))));
        assert_eq!(installer.active_hooks(), 0);
    }

    #[test]
    fn test_deliveries_pair_injections_with_foreground_window() {
        let injector = MockInputInjector::new();
        let a = SyntheticEvent::new(DeviceClass::Keyboard, keyroute_core::KeyAction::Down, 0x41);

        injector.bring_to_foreground(WindowHandle(0x10));
        injector.inject(&a);
        injector.bring_to_foreground(WindowHandle(0x20));
        injector.inject(&a);

        assert_eq!(
            injector.deliveries(),
            vec![(WindowHandle(0x10), a), (WindowHandle(0x20), a)]
        );
    }

    #[test]
    fn test_window_directory_forgets_removed_process() {
        let windows = MockWindowDirectory::new();
        windows.add(ProcessId(5), WindowHandle(0x50));

        windows.remove(ProcessId(5));

        assert_eq!(windows.main_window(ProcessId(5)), None);
        assert!(!windows.is_window(WindowHandle(0x50)));
        assert_eq!(windows.owner(WindowHandle(0x50)), None);
    }

    #[test]
    fn test_window_directory_reports_owning_process() {
        let windows = MockWindowDirectory::new();
        windows.add(ProcessId(5), WindowHandle(0x50));
        windows.add(ProcessId(6), WindowHandle(0x60));

        assert_eq!(windows.owner(WindowHandle(0x60)), Some(ProcessId(6)));
        assert_eq!(windows.owner(WindowHandle(0x70)), None);
    }
}
