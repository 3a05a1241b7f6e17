//! Application layer for the redirector.
//!
//! Use cases in this layer orchestrate `keyroute_core` domain types and talk
//! to the OS only through traits (`HookInstaller`, `InputInjector`,
//! `WindowDirectory`) implemented by the infrastructure layer.
//!
//! # Sub-modules
//!
//! - **`engine`**     – The hook lifecycle manager. Owns the single hook
//!   handle, the device class, the target registry and the key-state mirror,
//!   and exposes the control plane: configure, bind, engage, disengage.
//!
//! - **`classify`**   – The per-event decision function run inside the OS
//!   hook callback: escape, forward to N targets, or ignore.
//!
//! - **`synthesize`** – Builds synthetic input descriptors and submits them
//!   through the injection boundary after foregrounding the target window.

pub mod classify;
pub mod engine;
pub mod synthesize;
