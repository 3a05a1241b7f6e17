//! Win32 platform adapters: low-level hooks, `SendInput`, window lookup.
//!
//! # How low-level hooks work (for beginners)
//!
//! `SetWindowsHookExW(WH_KEYBOARD_LL, …)` asks Windows to call our function
//! for every keyboard event on the desktop, before any application sees it.
//! Windows delivers those calls *on the thread that installed the hook*, and
//! only while that thread is pumping messages. So the installer:
//!
//! 1. spawns a dedicated "keyroute-hook-loop" thread,
//! 2. installs the hook from that thread and reports the outcome back,
//! 3. runs `GetMessageW` on that thread until it receives `WM_QUIT`.
//!
//! Returning a non-zero `LRESULT` from the hook swallows the event; calling
//! `CallNextHookEx` lets it continue to the focused application.
//!
//! # Trampoline
//!
//! A hook procedure is a bare `extern "system" fn` with no user-data pointer.
//! The active [`HookSink`] therefore lives in a process-wide slot that the
//! procedures read. The slot holds at most one sink, which is also why only
//! one hook may be installed per process.
//!
//! # Injected events
//!
//! Our own `SendInput` calls pass through every low-level hook, ours
//! included. Events flagged `LLKHF_INJECTED` / `LLMHF_INJECTED` are handed
//! straight to the next hook so redirected keys are never redirected again.

#![cfg(target_os = "windows")]

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use keyroute_core::keymap::windows_vk::{
    VK_LBUTTON, VK_MBUTTON, VK_RBUTTON, VK_XBUTTON1, VK_XBUTTON2,
};
use keyroute_core::{DeviceClass, KeyAction, ProcessId, SyntheticEvent, WindowHandle};
use tracing::{debug, warn};
use windows::core::BOOL;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_TYPE, KEYBDINPUT, KEYBD_EVENT_FLAGS, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP, MOUSEINPUT,
    MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, EnumWindows, GetMessageW, GetWindow,
    GetWindowThreadProcessId, IsWindow, IsWindowVisible, PostQuitMessage, PostThreadMessageW,
    SetForegroundWindow, SetWindowsHookExW, UnhookWindowsHookEx, GW_OWNER, HHOOK,
    KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS, LLKHF_INJECTED, LLMHF_INJECTED, MSG, MSLLHOOKSTRUCT,
    WINDOWS_HOOK_ID, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN,
    WM_MBUTTONUP, WM_QUIT, WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SYSKEYDOWN, WM_SYSKEYUP,
    WM_XBUTTONDOWN, WM_XBUTTONUP, XBUTTON1, XBUTTON2,
};

use crate::application::classify::{HookVerdict, RawHookEvent};
use crate::application::engine::{HookError, HookHandle, HookInstaller, HookSink, WindowDirectory};
use crate::application::synthesize::InputInjector;

type HookProc = unsafe extern "system" fn(i32, WPARAM, LPARAM) -> LRESULT;

/// The sink the hook procedures forward into. `Some` exactly while a hook
/// installed by this process is live.
static ACTIVE_SINK: Mutex<Option<Arc<dyn HookSink>>> = Mutex::new(None);

/// Thread ID of the running hook message loop, or 0.
static HOOK_THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Join handle of the running hook message loop.
static HOOK_THREAD: Mutex<Option<JoinHandle<()>>> = Mutex::new(None);

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut c_void)
}

// ── Hook installer ────────────────────────────────────────────────────────────

/// Installs `WH_KEYBOARD_LL` / `WH_MOUSE_LL` hooks on a dedicated thread.
pub struct WindowsHookInstaller;

impl WindowsHookInstaller {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsHookInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl HookInstaller for WindowsHookInstaller {
    fn install(
        &self,
        device: DeviceClass,
        sink: Arc<dyn HookSink>,
    ) -> Result<HookHandle, HookError> {
        let hook_proc: HookProc = match device {
            DeviceClass::Keyboard => keyboard_hook_proc,
            DeviceClass::Mouse => mouse_hook_proc,
            DeviceClass::Unset => {
                return Err(HookError::InstallRejected("device class is unset".into()))
            }
        };
        let hook_id = device
            .hook_id()
            .ok_or_else(|| HookError::InstallRejected("device class has no hook id".into()))?;

        {
            let mut slot = lock(&ACTIVE_SINK);
            if slot.is_some() {
                return Err(HookError::AlreadyInstalled);
            }
            *slot = Some(sink);
        }

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("keyroute-hook-loop".to_string())
            .spawn(move || run_hook_message_loop(hook_id, hook_proc, tx));

        let join = match spawned {
            Ok(join) => join,
            Err(e) => {
                lock(&ACTIVE_SINK).take();
                return Err(HookError::InstallRejected(e.to_string()));
            }
        };

        match rx.recv() {
            Ok(Ok(raw)) => {
                *lock(&HOOK_THREAD) = Some(join);
                debug!(%device, hook = raw, "low-level hook installed");
                Ok(HookHandle(raw))
            }
            Ok(Err(e)) => {
                let _ = join.join();
                lock(&ACTIVE_SINK).take();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                lock(&ACTIVE_SINK).take();
                Err(HookError::InstallRejected(
                    "hook thread exited before reporting".into(),
                ))
            }
        }
    }

    fn remove(&self, handle: HookHandle) -> Result<(), HookError> {
        // SAFETY: the handle was produced by SetWindowsHookExW in this process.
        let unhooked = unsafe { UnhookWindowsHookEx(HHOOK(handle.0 as *mut c_void)) };

        let loop_thread = HOOK_THREAD_ID.swap(0, Ordering::SeqCst);
        // SAFETY: no preconditions.
        let current = unsafe { GetCurrentThreadId() };

        if loop_thread != 0 && loop_thread == current {
            // Inside a hook callback: the loop exits after this callback
            // returns. The thread cannot join itself, so detach it.
            unsafe { PostQuitMessage(0) };
            lock(&HOOK_THREAD).take();
        } else {
            if loop_thread != 0 {
                // SAFETY: posting WM_QUIT to a thread ID we recorded.
                if let Err(e) =
                    unsafe { PostThreadMessageW(loop_thread, WM_QUIT, WPARAM(0), LPARAM(0)) }
                {
                    warn!(error = %e, "could not stop hook message loop");
                }
            }
            let join = lock(&HOOK_THREAD).take();
            if let Some(join) = join {
                let _ = join.join();
            }
        }

        // Drop the sink outside the slot lock.
        let sink = lock(&ACTIVE_SINK).take();
        drop(sink);

        unhooked.map_err(|e| HookError::RemoveFailed(e.to_string()))
    }
}

/// Body of the hook thread: install, report, pump.
fn run_hook_message_loop(hook_id: i32, hook_proc: HookProc, tx: Sender<Result<isize, HookError>>) {
    // SAFETY: a null module name returns the handle of the running executable.
    let module = match unsafe { GetModuleHandleW(None) } {
        Ok(module) => module,
        Err(e) => {
            let _ = tx.send(Err(HookError::ModuleUnresolved(e.to_string())));
            return;
        }
    };

    // SAFETY: hook_proc is a valid extern "system" fn for the lifetime of the
    // process, and module is this executable.
    let hook = match unsafe {
        SetWindowsHookExW(WINDOWS_HOOK_ID(hook_id), Some(hook_proc), Some(module.into()), 0)
    } {
        Ok(hook) => hook,
        Err(e) => {
            let _ = tx.send(Err(HookError::InstallRejected(e.to_string())));
            return;
        }
    };

    // SAFETY: no preconditions.
    HOOK_THREAD_ID.store(unsafe { GetCurrentThreadId() }, Ordering::SeqCst);
    let _ = tx.send(Ok(hook.0 as isize));

    let mut msg = MSG::default();
    // SAFETY: msg is a valid MSG for the duration of the loop. GetMessageW
    // returns -1 on error and 0 on WM_QUIT; both end the loop.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            DispatchMessageW(&msg);
        }
    }
    debug!("hook message loop exited");
}

/// Hands `event` to the active sink. `None` when no sink is registered or the
/// sink panicked.
fn dispatch(event: RawHookEvent) -> Option<HookVerdict> {
    let sink = lock(&ACTIVE_SINK).clone()?;
    panic::catch_unwind(AssertUnwindSafe(|| sink.on_event(event))).ok()
}

fn finish(verdict: Option<HookVerdict>, n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
    match verdict {
        Some(HookVerdict::Suppress) => LRESULT(1),
        // SAFETY: forwarding the arguments we were given.
        _ => unsafe { CallNextHookEx(None, n_code, w_param, l_param) },
    }
}

/// `WH_KEYBOARD_LL` procedure.
///
/// # Safety
///
/// Called by Windows with `l_param` pointing at a `KBDLLHOOKSTRUCT` whenever
/// `n_code >= 0`.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code < 0 {
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: guaranteed by the hook contract for n_code >= 0.
    let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
    if (kbs.flags & LLKHF_INJECTED) != KBDLLHOOKSTRUCT_FLAGS(0) {
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    let action = match w_param.0 as u32 {
        WM_KEYDOWN | WM_SYSKEYDOWN => KeyAction::Down,
        WM_KEYUP | WM_SYSKEYUP => KeyAction::Up,
        _ => KeyAction::Other,
    };

    let event = RawHookEvent {
        code: n_code,
        action,
        vk_code: kbs.vkCode,
        injected: false,
    };
    finish(dispatch(event), n_code, w_param, l_param)
}

/// `WH_MOUSE_LL` procedure.
///
/// # Safety
///
/// Called by Windows with `l_param` pointing at an `MSLLHOOKSTRUCT` whenever
/// `n_code >= 0`.
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code < 0 {
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: guaranteed by the hook contract for n_code >= 0.
    let mhs = &*(l_param.0 as *const MSLLHOOKSTRUCT);
    if mhs.flags & LLMHF_INJECTED != 0 {
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    let (action, vk_code) = classify_mouse_message(w_param.0 as u32, mhs.mouseData);
    let event = RawHookEvent {
        code: n_code,
        action,
        vk_code,
        injected: false,
    };
    finish(dispatch(event), n_code, w_param, l_param)
}

/// Maps a mouse hook message to an action and the button's VK code.
/// Moves, wheel ticks and anything else become `Other` with code 0.
fn classify_mouse_message(message: u32, mouse_data: u32) -> (KeyAction, u32) {
    let x_button = || {
        if (mouse_data >> 16) as u16 == XBUTTON1 {
            VK_XBUTTON1
        } else {
            VK_XBUTTON2
        }
    };
    match message {
        WM_LBUTTONDOWN => (KeyAction::Down, VK_LBUTTON),
        WM_LBUTTONUP => (KeyAction::Up, VK_LBUTTON),
        WM_RBUTTONDOWN => (KeyAction::Down, VK_RBUTTON),
        WM_RBUTTONUP => (KeyAction::Up, VK_RBUTTON),
        WM_MBUTTONDOWN => (KeyAction::Down, VK_MBUTTON),
        WM_MBUTTONUP => (KeyAction::Up, VK_MBUTTON),
        WM_XBUTTONDOWN => (KeyAction::Down, x_button()),
        WM_XBUTTONUP => (KeyAction::Up, x_button()),
        _ => (KeyAction::Other, 0),
    }
}

// ── Input injector ────────────────────────────────────────────────────────────

/// Injects input with `SendInput` after `SetForegroundWindow`.
pub struct WindowsInputInjector;

impl WindowsInputInjector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsInputInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl InputInjector for WindowsInputInjector {
    fn bring_to_foreground(&self, window: WindowHandle) {
        // SAFETY: SetForegroundWindow tolerates stale handles and reports
        // failure through its return value, which is deliberately unobserved.
        let _ = unsafe { SetForegroundWindow(hwnd(window)) };
    }

    fn inject(&self, event: &SyntheticEvent) {
        let anonymous = match event.device {
            DeviceClass::Keyboard => INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(event.vk_code as u16),
                    wScan: event.scan_code,
                    dwFlags: KEYBD_EVENT_FLAGS(event.event_flags()),
                    time: 0,
                    dwExtraInfo: event.extra_info,
                },
            },
            DeviceClass::Mouse => {
                let (flags, mouse_data) = mouse_button_flags(event.action, event.vk_code);
                INPUT_0 {
                    mi: MOUSEINPUT {
                        dx: 0,
                        dy: 0,
                        mouseData: mouse_data,
                        dwFlags: flags,
                        time: 0,
                        dwExtraInfo: event.extra_info,
                    },
                }
            }
            DeviceClass::Unset => {
                warn!("synthetic event with unset device class dropped");
                return;
            }
        };

        let input = INPUT {
            r#type: INPUT_TYPE(event.input_type()),
            Anonymous: anonymous,
        };
        // SAFETY: input is a fully initialised INPUT of the declared type.
        unsafe {
            SendInput(&[input], std::mem::size_of::<INPUT>() as i32);
        }
    }
}

/// `MOUSEEVENTF_*` flags and `mouseData` for a button VK. `Other` maps to
/// the down flag; an unknown VK becomes a zero-distance move.
fn mouse_button_flags(action: KeyAction, vk_code: u32) -> (MOUSE_EVENT_FLAGS, u32) {
    let down = action != KeyAction::Up;
    match (vk_code, down) {
        (VK_LBUTTON, true) => (MOUSEEVENTF_LEFTDOWN, 0),
        (VK_LBUTTON, false) => (MOUSEEVENTF_LEFTUP, 0),
        (VK_RBUTTON, true) => (MOUSEEVENTF_RIGHTDOWN, 0),
        (VK_RBUTTON, false) => (MOUSEEVENTF_RIGHTUP, 0),
        (VK_MBUTTON, true) => (MOUSEEVENTF_MIDDLEDOWN, 0),
        (VK_MBUTTON, false) => (MOUSEEVENTF_MIDDLEUP, 0),
        (VK_XBUTTON1, true) => (MOUSEEVENTF_XDOWN, XBUTTON1 as u32),
        (VK_XBUTTON1, false) => (MOUSEEVENTF_XUP, XBUTTON1 as u32),
        (VK_XBUTTON2, true) => (MOUSEEVENTF_XDOWN, XBUTTON2 as u32),
        (VK_XBUTTON2, false) => (MOUSEEVENTF_XUP, XBUTTON2 as u32),
        _ => (MOUSEEVENTF_MOVE, 0),
    }
}

// ── Window directory ──────────────────────────────────────────────────────────

/// Window queries backed by `IsWindow`, `GetWindowThreadProcessId` and
/// `EnumWindows`.
pub struct WindowsWindowDirectory;

impl WindowsWindowDirectory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsWindowDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowDirectory for WindowsWindowDirectory {
    fn is_window(&self, window: WindowHandle) -> bool {
        // SAFETY: IsWindow accepts any value and only reports validity.
        !window.is_null() && unsafe { IsWindow(Some(hwnd(window))) }.as_bool()
    }

    fn main_window(&self, process: ProcessId) -> Option<WindowHandle> {
        let mut search = MainWindowSearch {
            pid: process.0,
            found: None,
        };
        // SAFETY: `search` outlives the synchronous EnumWindows call. The
        // callback stops enumeration early, which EnumWindows reports as an
        // error; the outcome is read from `search` instead.
        let _ = unsafe {
            EnumWindows(
                Some(find_main_window),
                LPARAM(&mut search as *mut MainWindowSearch as isize),
            )
        };
        search.found
    }

    fn owner(&self, window: WindowHandle) -> Option<ProcessId> {
        if !self.is_window(window) {
            return None;
        }
        let mut pid = 0u32;
        // SAFETY: `pid` outlives the call; a stale handle yields thread id 0.
        let thread = unsafe { GetWindowThreadProcessId(hwnd(window), Some(&mut pid as *mut u32)) };
        (thread != 0 && pid != 0).then_some(ProcessId(pid))
    }
}

struct MainWindowSearch {
    pid: u32,
    found: Option<WindowHandle>,
}

/// `EnumWindows` callback: stops at the first visible, unowned top-level
/// window belonging to the searched process.
unsafe extern "system" fn find_main_window(window: HWND, l_param: LPARAM) -> BOOL {
    // SAFETY: l_param is the MainWindowSearch passed by main_window.
    let search = &mut *(l_param.0 as *mut MainWindowSearch);

    let mut pid = 0u32;
    GetWindowThreadProcessId(window, Some(&mut pid as *mut u32));
    if pid != search.pid || !IsWindowVisible(window).as_bool() {
        return BOOL(1);
    }

    let owned = GetWindow(window, GW_OWNER)
        .map(|owner| !owner.is_invalid())
        .unwrap_or(false);
    if owned {
        return BOOL(1);
    }

    search.found = Some(WindowHandle(window.0 as isize));
    BOOL(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_messages_map_to_button_vks() {
        assert_eq!(
            classify_mouse_message(WM_LBUTTONDOWN, 0),
            (KeyAction::Down, VK_LBUTTON)
        );
        assert_eq!(
            classify_mouse_message(WM_RBUTTONUP, 0),
            (KeyAction::Up, VK_RBUTTON)
        );
        assert_eq!(
            classify_mouse_message(WM_XBUTTONDOWN, (XBUTTON2 as u32) << 16),
            (KeyAction::Down, VK_XBUTTON2)
        );
    }

    #[test]
    fn test_mouse_move_is_other_with_zero_code() {
        let wm_mousemove = 0x0200;

        assert_eq!(
            classify_mouse_message(wm_mousemove, 0),
            (KeyAction::Other, 0)
        );
    }

    #[test]
    fn test_mouse_button_flags_pair_down_and_up() {
        assert_eq!(
            mouse_button_flags(KeyAction::Down, VK_LBUTTON),
            (MOUSEEVENTF_LEFTDOWN, 0)
        );
        assert_eq!(
            mouse_button_flags(KeyAction::Up, VK_XBUTTON1),
            (MOUSEEVENTF_XUP, XBUTTON1 as u32)
        );
        assert_eq!(
            mouse_button_flags(KeyAction::Other, VK_MBUTTON),
            (MOUSEEVENTF_MIDDLEDOWN, 0)
        );
    }

    #[test]
    fn test_null_window_is_not_a_window() {
        assert!(!WindowsWindowDirectory::new().is_window(WindowHandle::NULL));
    }
}
