//! The redirect engine: hook lifecycle, target bindings, per-event dispatch.
//!
//! # States (for beginners)
//!
//! ```text
//!             engage() ok
//!  Unhooked ───────────────► Hooked
//!     ▲                         │
//!     └──── disengage() / ──────┘
//!           configure() / escape key
//! ```
//!
//! While `Hooked`, the OS calls [`HookSink::on_event`] on its hook-delivery
//! thread for every input event. The control plane (`configure`, `bind`,
//! `engage`, `disengage`) runs on whatever thread hosts the user-facing
//! surface. Both sides share one `Mutex<EngineState>`.
//!
//! # Locking rules
//!
//! - The state lock is held only for short, non-blocking sections. It is never
//!   held while foregrounding windows, injecting input, or removing the hook:
//!   removal may join the hook thread, which may itself be waiting for the
//!   state lock inside `on_event`.
//! - A second `control` lock serialises control-plane operations against each
//!   other so two concurrent `engage` calls cannot both install a hook. The
//!   hook thread never takes it, so the escape path can disengage from inside
//!   the callback while another thread is mid-operation.
//! - Whichever path first takes the hook handle out of the state owns its
//!   removal. While that removal is in flight `removing` is set. Control
//!   operations wait on `removal_done` before touching the hook, so none of
//!   them returns while an old hook is still in the chain.
//! - The hook thread never waits. An escape that lands while another thread
//!   owns a removal sets `disarm_pending`; the owner reads it afterwards and
//!   stays unhooked instead of installing a replacement.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use keyroute_core::{
    key_name, DeviceClass, KeyFilter, KeyStateTracker, ProcessId, TargetBinding, TargetRegistry,
    WindowHandle, VK_ESCAPE,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::classify::{
    Classification, EventClassifier, HookVerdict, PassThroughPolicy, RawHookEvent,
};
use crate::application::synthesize::{InputInjector, SyntheticInputBuilder};

// ── Boundary traits ───────────────────────────────────────────────────────────

/// Opaque identifier of an installed OS hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub isize);

/// Errors reported by the OS hook boundary.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("could not resolve the current module handle: {0}")]
    ModuleUnresolved(String),

    #[error("the OS rejected the hook registration: {0}")]
    InstallRejected(String),

    #[error("a global hook is already installed in this process")]
    AlreadyInstalled,

    #[error("the OS failed to remove the hook: {0}")]
    RemoveFailed(String),

    #[error("global input hooks are not supported on {0}")]
    UnsupportedPlatform(String),
}

/// Receives raw events from an installed hook.
///
/// Implementations run on the OS hook-delivery thread and must return
/// promptly.
pub trait HookSink: Send + Sync {
    fn on_event(&self, event: RawHookEvent) -> HookVerdict;
}

/// Installs and removes the process-wide global hook.
pub trait HookInstaller: Send + Sync {
    /// Installs a low-level hook for `device` that forwards every event to
    /// `sink`. Module resolution failures are reported here too.
    fn install(
        &self,
        device: DeviceClass,
        sink: Arc<dyn HookSink>,
    ) -> Result<HookHandle, HookError>;

    /// Removes the hook identified by `handle`.
    ///
    /// Must be callable from inside `sink.on_event` on the hook thread.
    fn remove(&self, handle: HookHandle) -> Result<(), HookError>;
}

/// Read-only view of top-level windows.
pub trait WindowDirectory: Send + Sync {
    /// Whether `window` currently identifies a live window.
    fn is_window(&self, window: WindowHandle) -> bool;

    /// The main (first visible, unowned, top-level) window of `process`.
    fn main_window(&self, process: ProcessId) -> Option<WindowHandle>;

    /// The process that created `window`, or `None` for a dead window.
    fn owner(&self, window: WindowHandle) -> Option<ProcessId>;
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors returned by the engine's control-plane operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to install the input hook: {0}")]
    HookInstallFailure(#[source] HookError),

    /// The hook handle was cleared locally regardless; this is a warning.
    #[error("failed to remove the input hook (state cleared anyway): {0}")]
    UnhookFailure(#[source] HookError),

    #[error("cannot bind process {pid}: {reason}")]
    TargetResolutionFailure { pid: ProcessId, reason: String },
}

impl EngineError {
    /// Returns `true` for errors that leave the engine in a consistent state
    /// and only need reporting.
    pub fn is_warning(&self) -> bool {
        matches!(self, EngineError::UnhookFailure(_))
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

/// Tunables fixed at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Keyboard key that disarms the hook.
    pub escape_vk: u32,
    pub pass_through: PassThroughPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            escape_vk: VK_ESCAPE,
            pass_through: PassThroughPolicy::default(),
        }
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct EngineState {
    device: DeviceClass,
    hook: Option<HookHandle>,
    removing: bool,
    disarm_pending: bool,
    registry: TargetRegistry,
    keys: KeyStateTracker,
}

/// Hook lifecycle manager and event dispatcher.
///
/// Construct it inside an `Arc`: [`engage`](Self::engage) registers the
/// engine itself as the hook sink.
pub struct RedirectEngine {
    state: Mutex<EngineState>,
    removal_done: Condvar,
    control: Mutex<()>,
    classifier: EventClassifier,
    builder: SyntheticInputBuilder,
    installer: Arc<dyn HookInstaller>,
    windows: Arc<dyn WindowDirectory>,
}

impl RedirectEngine {
    pub fn new(
        installer: Arc<dyn HookInstaller>,
        injector: Arc<dyn InputInjector>,
        windows: Arc<dyn WindowDirectory>,
        options: EngineOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EngineState::default()),
            removal_done: Condvar::new(),
            control: Mutex::new(()),
            classifier: EventClassifier::new(options.escape_vk, options.pass_through),
            builder: SyntheticInputBuilder::new(injector),
            installer,
            windows,
        })
    }

    /// Sets the active device class, disengaging first if hooked.
    ///
    /// A failed unhook is logged; the engine is unhooked either way.
    pub fn configure(&self, device: DeviceClass) {
        let _control = self.control();
        if let Err(e) = self.release_hook() {
            warn!(error = %e, "unhook during reconfiguration failed");
        }
        self.state().device = device;
        info!(%device, "device class configured");
    }

    /// Inserts or replaces the binding for `process`.
    ///
    /// `window` must be a live window owned by `process`; resolving it from
    /// the process is the caller's job (see [`bind_process`](Self::bind_process)).
    pub fn bind(
        &self,
        process: ProcessId,
        window: WindowHandle,
        filter: KeyFilter,
    ) -> Result<(), EngineError> {
        if window.is_null() {
            return Err(self.reject(process, "window handle is zero"));
        }
        if !self.windows.is_window(window) {
            return Err(self.reject(process, &format!("window {window} does not exist")));
        }
        match self.windows.owner(window) {
            Some(owner) if owner == process => {}
            Some(owner) => {
                return Err(self.reject(
                    process,
                    &format!("window {window} belongs to process {owner}"),
                ))
            }
            None => return Err(self.reject(process, &format!("window {window} does not exist"))),
        }

        let replaced = self
            .state()
            .registry
            .bind(TargetBinding::new(process, window, filter.clone()));
        info!(pid = %process, %window, %filter, replaced, "target bound");
        Ok(())
    }

    /// Resolves the main window of `process` and binds it.
    pub fn bind_process(&self, process: ProcessId, filter: KeyFilter) -> Result<(), EngineError> {
        match self.windows.main_window(process) {
            Some(window) => self.bind(process, window, filter),
            None => Err(self.reject(process, "process has no main window")),
        }
    }

    /// Installs the hook for the configured device.
    ///
    /// Does nothing when the device is `Unset` or no target is bound. When
    /// already hooked, the existing hook is removed and a fresh one installed;
    /// bindings are kept. An escape pressed during that swap wins: the engine
    /// ends up unhooked with no bindings.
    pub fn engage(self: &Arc<Self>) -> Result<(), EngineError> {
        let _control = self.control();

        let (device, previous) = {
            let mut state = self.settled_state();
            if !state.device.is_set() || state.registry.is_empty() {
                debug!(
                    device = %state.device,
                    targets = state.registry.len(),
                    "engage skipped: nothing to hook"
                );
                return Ok(());
            }
            let previous = state.hook.take();
            if previous.is_some() {
                state.removing = true;
                state.disarm_pending = false;
            }
            (state.device, previous)
        };

        if let Some(old) = previous {
            let removed = self.installer.remove(old);
            let disarmed = self.finish_removal();
            if let Err(e) = removed {
                warn!(error = %e, "removing previous hook before re-engage failed");
            }
            if disarmed {
                info!("escape pressed while re-engaging; staying unhooked");
                return Ok(());
            }
        }

        let sink: Arc<dyn HookSink> = Arc::clone(self) as Arc<dyn HookSink>;
        // Held across install so the first delivered event sees the new handle.
        let mut state = self.state();
        match self.installer.install(device, sink) {
            Ok(handle) => {
                state.hook = Some(handle);
                info!(%device, targets = state.registry.len(), "input hook engaged");
                Ok(())
            }
            Err(e) => {
                warn!(%device, error = %e, "input hook installation failed");
                Err(EngineError::HookInstallFailure(e))
            }
        }
    }

    /// Removes the hook and clears every binding. No-op when unhooked.
    pub fn disengage(&self) -> Result<(), EngineError> {
        let _control = self.control();
        self.release_hook()
    }

    pub fn is_engaged(&self) -> bool {
        self.state().hook.is_some()
    }

    pub fn device(&self) -> DeviceClass {
        self.state().device
    }

    /// Snapshot of the current bindings in fan-out order.
    pub fn bindings(&self) -> Vec<TargetBinding> {
        self.state().registry.iter().cloned().collect()
    }

    /// Whether `code` is held according to the forwarded-event mirror.
    pub fn is_held(&self, code: u32) -> bool {
        self.state().keys.get(code)
    }

    pub fn escape_vk(&self) -> u32 {
        self.classifier.escape_vk()
    }

    pub fn pass_through(&self) -> PassThroughPolicy {
        self.classifier.policy()
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn control(&self) -> MutexGuard<'_, ()> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reject(&self, pid: ProcessId, reason: &str) -> EngineError {
        warn!(%pid, reason, "bind rejected");
        EngineError::TargetResolutionFailure {
            pid,
            reason: reason.to_string(),
        }
    }

    /// Locks the state once no removal is in flight. Control plane only.
    fn settled_state(&self) -> MutexGuard<'_, EngineState> {
        let mut state = self.state();
        while state.removing {
            state = self
                .removal_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state
    }

    /// Clears `removing`, wakes waiters and returns whether an escape asked
    /// for a disarm while the removal ran.
    fn finish_removal(&self) -> bool {
        let disarmed = {
            let mut state = self.state();
            state.removing = false;
            std::mem::take(&mut state.disarm_pending)
        };
        self.removal_done.notify_all();
        disarmed
    }

    /// Control-plane disengage: waits out any in-flight removal, then takes
    /// the handle out of the state and removes it.
    fn release_hook(&self) -> Result<(), EngineError> {
        let handle = {
            let mut state = self.settled_state();
            let Some(handle) = Self::take_for_removal(&mut state) else {
                return Ok(());
            };
            handle
        };
        self.remove_taken(handle)
    }

    /// Escape-key disengage on the hook thread. Never blocks on another
    /// removal: when one is in flight the disarm is left for its owner.
    fn release_on_escape(&self) -> Result<(), EngineError> {
        let handle = {
            let mut state = self.state();
            if state.removing {
                state.registry.clear();
                state.disarm_pending = true;
                return Ok(());
            }
            let Some(handle) = Self::take_for_removal(&mut state) else {
                return Ok(());
            };
            handle
        };
        self.remove_taken(handle)
    }

    fn take_for_removal(state: &mut EngineState) -> Option<HookHandle> {
        let handle = state.hook.take()?;
        state.registry.clear();
        state.removing = true;
        Some(handle)
    }

    fn remove_taken(&self, handle: HookHandle) -> Result<(), EngineError> {
        let removed = self.installer.remove(handle);
        self.finish_removal();

        match removed {
            Ok(()) => {
                info!("input hook disengaged");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "input hook removal failed; handle cleared");
                Err(EngineError::UnhookFailure(e))
            }
        }
    }
}

impl HookSink for RedirectEngine {
    fn on_event(&self, event: RawHookEvent) -> HookVerdict {
        let (device, classification, verdict) = {
            let state = self.state();
            let classification = self.classifier.classify(&event, state.device, &state.registry);
            let bound = !state.registry.is_empty();
            let verdict = self.classifier.verdict(&event, &classification, bound);
            (state.device, classification, verdict)
        };

        match classification {
            Classification::Ignore => {}
            Classification::Escape => {
                debug!(key = %key_name(event.vk_code), "escape key pressed; disengaging");
                if let Err(e) = self.release_on_escape() {
                    warn!(error = %e, "disengage on escape reported a failure");
                }
            }
            Classification::Forward(windows) => {
                for window in windows {
                    self.builder.send(device, event.action, event.vk_code, window);
                }
                self.state().keys.apply(event.action, event.vk_code);
            }
        }

        verdict
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
