//! Generic platform for devices with no vendor-specific setup.

use crate::platform::PlatformDefinition;

/// Create the generic platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new("generic")
}
