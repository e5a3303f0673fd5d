//! Connectors turn a [`SessionConfig`] into a live shell channel.

use std::future::Future;
use std::time::Duration;

use log::debug;
use russh::ChannelStream;
use russh::client::Msg;

use super::config::{Protocol, SessionConfig};
use super::ssh::SshTransport;
use crate::channel::{ShellChannel, StreamChannel};
use crate::error::{Result, TransportError};

/// Opens interactive shell channels for a session.
pub trait Connector: Send + Sync {
    /// Channel type produced by this connector.
    type Channel: ShellChannel;

    /// Connect, authenticate and start an interactive shell.
    fn connect(&self, config: &SessionConfig) -> impl Future<Output = Result<Self::Channel>> + Send;
}

/// Default connector: SSH for [`Protocol::Ssh`], unsupported otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl Connector for SshConnector {
    type Channel = SshShell;

    async fn connect(&self, config: &SessionConfig) -> Result<SshShell> {
        match config.protocol {
            Protocol::Ssh => {}
            other => return Err(TransportError::UnsupportedProtocol(other).into()),
        }

        let mut transport = SshTransport::connect(config.clone()).await?;
        match transport.open_shell().await {
            Ok(stream) => Ok(SshShell {
                channel: StreamChannel::new(stream),
                transport,
            }),
            Err(e) => {
                transport.release().await;
                Err(e)
            }
        }
    }
}

/// Interactive SSH shell: the shell channel plus the session that carries it.
pub struct SshShell {
    channel: StreamChannel<ChannelStream<Msg>>,
    transport: SshTransport,
}

impl ShellChannel for SshShell {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.channel.write(data).await
    }

    fn ready_to_read(&mut self) -> Result<bool> {
        self.channel.ready_to_read()
    }

    async fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        self.channel.wait_readable(timeout).await
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        self.channel.read_available()
    }

    async fn close(&mut self) {
        self.channel.close().await;
        self.transport.release().await;
        debug!("SSH shell closed");
    }
}
