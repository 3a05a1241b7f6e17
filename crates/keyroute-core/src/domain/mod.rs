//! Domain entities for KeyRoute.
//!
//! Pure data and rules with no infrastructure dependencies. The application
//! layer in `keyroute-redirector` orchestrates these types; the OS adapters
//! translate to and from them at the hook and injection boundaries.

/// Device classes and key actions, with their Win32 numeric tags.
pub mod device;

/// Local mirror of which virtual keys are currently held.
pub mod key_state;

/// Fully described synthetic input event, ready for injection.
pub mod synthetic;

/// Target bindings and the registry that fans events out to them.
pub mod target;
