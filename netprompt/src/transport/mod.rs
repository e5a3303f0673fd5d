//! Transport layer: connection configuration and SSH session setup.
//!
//! The transport produces an interactive shell channel; everything above it
//! only sees the [`ShellChannel`](crate::channel::ShellChannel) contract.

pub mod config;
mod connector;
mod ssh;

pub use config::{HostKeyVerification, Protocol, SessionConfig, SessionOptions};
pub use connector::{Connector, SshConnector, SshShell};
pub use ssh::SshTransport;
