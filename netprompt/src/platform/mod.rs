//! Platform definitions for per-vendor session behavior.
//!
//! A platform tells the session core which in-band markers the device uses
//! (invalid command, pagination) and which commands set up a fresh shell.
//! Platforms are looked up by name in an explicit [`PlatformRegistry`].

mod definition;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use registry::PlatformRegistry;
