//! Datacom DmOS switch platforms (DM4100 family).
//!
//! # Prompt Examples
//!
//! ```text
//! SAO3-ASW5#                         # privileged exec
//! SAO3-ASW5(config)#                 # configuration
//! ```
//!
//! Long outputs stop at a `--More--` banner and continue on a space.

use crate::platform::PlatformDefinition;
use crate::transport::Protocol;

/// Create the Datacom SSH platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new("datacom_os")
        .with_invalid_marker("% Unknown command")
        .with_pagination(["--More--", "(END)"])
        .with_terminal_size(511, 24)
}

/// Datacom over the legacy plaintext shell.
pub fn telnet_platform() -> PlatformDefinition {
    platform()
        .renamed("datacom_os_telnet")
        .with_protocol(Protocol::Telnet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datacom_platform() {
        let platform = platform();
        assert_eq!(platform.name, "datacom_os");
        assert!(platform.is_invalid_command("% Invalid input detected"));
        assert_eq!(platform.pagination.find("\r\n--More--"), Some("--More--"));
        assert_eq!(platform.default_protocol, Protocol::Ssh);
    }

    #[test]
    fn test_telnet_variant() {
        let platform = telnet_platform();
        assert_eq!(platform.name, "datacom_os_telnet");
        assert_eq!(platform.default_protocol, Protocol::Telnet);
    }
}
