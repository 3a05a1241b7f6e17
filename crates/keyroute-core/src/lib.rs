//! # keyroute-core
//!
//! Domain layer for KeyRoute, a keystroke redirector: keys typed while one
//! application has focus are re-emitted as synthetic input aimed at another,
//! explicitly chosen, application window.
//!
//! This crate has zero dependencies on OS APIs. Everything here compiles and
//! tests on any host; the Win32 hook and injection plumbing lives in
//! `keyroute-redirector`.
//!
//! # Architecture overview (for beginners)
//!
//! The redirector sits between two OS subsystems:
//!
//! ```text
//!  global input hook ──► classify ──► build synthetic event ──► inject
//!                           │
//!                  registry + key state
//! ```
//!
//! This crate defines the vocabulary shared by every stage:
//!
//! - **`domain`** – device classes, key actions, target bindings and their
//!   key filters, the held-key mirror, and the synthetic input descriptor.
//!
//! - **`keymap`** – Windows virtual-key constants and the human-readable key
//!   name table used for filters on the command line and in log output.

pub mod domain;
pub mod keymap;

pub use domain::device::{DeviceClass, KeyAction};
pub use domain::key_state::KeyStateTracker;
pub use domain::synthetic::SyntheticEvent;
pub use domain::target::{
    KeyFilter, ProcessId, TargetBinding, TargetRegistry, WindowHandle,
};
pub use keymap::{key_name, parse_key, KeyParseError, VK_ESCAPE};
