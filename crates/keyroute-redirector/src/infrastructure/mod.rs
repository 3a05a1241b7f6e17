//! Infrastructure layer for the redirector.
//!
//! Contains OS-facing adapters: the Win32 hook/injection/window bindings (and
//! their in-memory stand-ins), command-line target parsing, and the TOML
//! configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keyroute_core`, but MUST NOT be imported by the `application` layer.

pub mod cli;
pub mod platform;
pub mod storage;
