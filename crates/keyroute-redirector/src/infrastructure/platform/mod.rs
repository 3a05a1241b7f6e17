//! OS platform adapters.
//!
//! The engine needs three capabilities from the OS: a global input hook
//! ([`HookInstaller`]), synthetic input injection ([`InputInjector`]), and a
//! view of top-level windows ([`WindowDirectory`]).
//!
//! | Platform | Implementation | Mechanism |
//! |----------|----------------|-----------|
//! | Windows  | `windows` module | `SetWindowsHookExW` + `SendInput` |
//! | any      | [`mock`] | in-memory recording |
//!
//! Low-level hooks are a Win32 concept; on other hosts [`native`] reports
//! [`HookError::UnsupportedPlatform`] and only the mock is available.

use std::sync::Arc;

use crate::application::engine::{HookError, HookInstaller, WindowDirectory};
use crate::application::synthesize::InputInjector;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// The three platform capabilities as trait objects, ready for
/// [`RedirectEngine::new`](crate::application::engine::RedirectEngine::new).
pub struct PlatformServices {
    pub installer: Arc<dyn HookInstaller>,
    pub injector: Arc<dyn InputInjector>,
    pub windows: Arc<dyn WindowDirectory>,
}

impl From<mock::MockPlatform> for PlatformServices {
    fn from(platform: mock::MockPlatform) -> Self {
        Self {
            installer: platform.installer,
            injector: platform.injector,
            windows: platform.windows,
        }
    }
}

/// Returns the real OS adapters for the current host.
///
/// # Errors
///
/// Returns [`HookError::UnsupportedPlatform`] on anything but Windows.
pub fn native() -> Result<PlatformServices, HookError> {
    #[cfg(target_os = "windows")]
    {
        Ok(PlatformServices {
            installer: Arc::new(self::windows::WindowsHookInstaller::new()),
            injector: Arc::new(self::windows::WindowsInputInjector::new()),
            windows: Arc::new(self::windows::WindowsWindowDirectory::new()),
        })
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(HookError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}
