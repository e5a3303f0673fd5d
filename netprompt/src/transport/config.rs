//! Session connection configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::channel::Encoding;

/// Remote shell protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Encrypted interactive shell over SSH.
    #[default]
    #[serde(alias = "secure-shell")]
    Ssh,

    /// Plaintext legacy shell. Declared, not implemented.
    #[serde(alias = "legacy")]
    Telnet,

    /// Serial console. Declared, not implemented.
    Serial,
}

impl Protocol {
    /// Default TCP port for the protocol.
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Ssh => 22,
            Protocol::Telnet => 23,
            Protocol::Serial => 0,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Ssh => "ssh",
            Protocol::Telnet => "telnet",
            Protocol::Serial => "serial",
        };
        f.write_str(name)
    }
}

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys.
    Strict,

    /// Accept and learn unknown keys, reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

/// Free-form session options, usually deserialized from a caller mapping.
///
/// ```
/// use netprompt::transport::{Protocol, SessionOptions};
///
/// let options = SessionOptions {
///     transport: Some(Protocol::Telnet),
///     ..Default::default()
/// };
/// assert_eq!(options.transport, Some(Protocol::Telnet));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionOptions {
    /// Transport selector.
    #[serde(default)]
    pub transport: Option<Protocol>,

    /// Port override.
    #[serde(default)]
    pub port: Option<u16>,

    /// Output encoding override.
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

/// Session configuration.
///
/// Immutable once the session is created.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Login password.
    pub password: SecretString,

    /// Optional enable/privilege secret.
    pub secret: Option<SecretString>,

    /// Protocol selector.
    pub protocol: Protocol,

    /// Character encoding of the device output.
    pub encoding: Encoding,

    /// Overall timeout for a single command.
    pub timeout: Duration,

    /// Timeout for TCP connect and SSH negotiation.
    pub connect_timeout: Duration,

    /// Open the session as part of construction.
    pub auto_connect: bool,

    /// Delay after each blank line sent during prompt detection.
    pub prompt_settle: Duration,

    /// Terminal width for the PTY.
    pub terminal_width: u32,

    /// Terminal height for the PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl SessionConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
