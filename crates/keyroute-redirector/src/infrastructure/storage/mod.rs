//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory (or an explicit path), writes a default file
//! on request, and falls back to defaults when no file exists yet.
//!
//! Target bindings are deliberately absent from the file: they name live
//! process IDs, which do not survive a restart.

pub mod config;
