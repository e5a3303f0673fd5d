//! Error types for netprompt.

use std::io;
use thiserror::Error;

use crate::transport::Protocol;

/// Main error type for netprompt operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (connect, negotiation, authentication)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Platform registry errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl Error {
    /// Whether this error means the device side of the session went away.
    pub fn is_session_closed(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::Closed) | Error::Channel(ChannelError::Io(_))
        )
    }
}

/// Transport layer errors, classified at connect time.
#[derive(Error, Debug)]
pub enum TransportError {
    /// TCP connection failed or the host was unreachable
    #[error("TCP connection to {host}:{port} failed: {message}")]
    ConnectTimeout {
        host: String,
        port: u16,
        message: String,
    },

    /// The host name could not be resolved
    #[error("DNS failure: the hostname '{host}' was not resolvable")]
    DnsFailure { host: String },

    /// Credentials were rejected by the remote end
    #[error("Authentication to device failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Handshake failed after the TCP connection succeeded
    #[error("{message}")]
    Negotiation { message: String, session_lost: bool },

    /// Host not present in known_hosts while verification is strict
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Protocol is declared but has no transport behind it
    #[error("Protocol '{0}' is not implemented")]
    UnsupportedProtocol(Protocol),

    /// SSH protocol error outside of connection setup
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Whether callers should treat this as a timeout-class connect failure.
    pub fn is_timeout_class(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectTimeout { .. }
                | TransportError::DnsFailure { .. }
                | TransportError::Negotiation { .. }
        )
    }
}

/// Channel layer errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Remote end closed the shell
    #[error("Session closed unexpectedly")]
    Closed,

    /// Socket-level failure on an established channel
    #[error("Session closed unexpectedly: {0}")]
    Io(#[from] io::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session lifecycle errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not open
    #[error("Session not connected - call open() first")]
    NotConnected,

    /// Session already open
    #[error("Session already connected")]
    AlreadyConnected,

    /// Invalid configuration passed to the builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Command list was empty
    #[error("No command given")]
    EmptyCommand,

    /// Session preparation failed after the transport came up
    #[error("Session preparation failed: {message}")]
    PreparationFailed { message: String },
}

/// Platform registry errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No platform registered under this name
    #[error("Unsupported platform '{name}', supported platforms are: {supported}")]
    UnknownPlatform { name: String, supported: String },

    /// Platform name already taken
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Result type alias using netprompt's Error.
pub type Result<T> = std::result::Result<T, Error>;
