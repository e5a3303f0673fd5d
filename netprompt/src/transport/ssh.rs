//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use russh::client::{self, Handle, KeyboardInteractiveAuthResponse, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelStream};
use secrecy::ExposeSecret;
use tokio::net::TcpStream;

use super::config::{HostKeyVerification, SessionConfig};
use crate::error::{Result, SessionError, TransportError};

/// SSH transport wrapping a russh client session.
pub struct SshTransport {
    /// The russh session handle. `None` once released.
    session: Option<Handle<SshHandler>>,

    /// Configuration used for this connection.
    config: SessionConfig,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    ///
    /// Every failure is classified into a [`TransportError`]; partially
    /// built resources are released before the error is returned.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let stream = Self::connect_tcp(&config).await?;
        debug!("{} TCP connection successful", config.socket_addr());

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        let session = match tokio::time::timeout(
            config.connect_timeout,
            client::connect_stream(ssh_config, stream, handler),
        )
        .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                // A detailed host-key error beats the generic UnknownKey
                let stored = host_key_error.lock().ok().and_then(|mut slot| slot.take());
                return Err(stored.unwrap_or_else(|| classify_negotiation(e)).into());
            }
            Err(_) => {
                return Err(TransportError::Negotiation {
                    message: format!(
                        "SSH negotiation with {} did not finish within {:?}: \
                         try increasing the connect timeout to 15 seconds or larger",
                        config.socket_addr(),
                        config.connect_timeout
                    ),
                    session_lost: true,
                }
                .into());
            }
        };

        let mut transport = Self {
            session: Some(session),
            config,
        };

        if let Err(e) = transport.authenticate().await {
            transport.release().await;
            return Err(e);
        }
        debug!("{} authenticated", transport.config.socket_addr());

        Ok(transport)
    }

    /// Resolve the host and open the TCP stream.
    async fn connect_tcp(config: &SessionConfig) -> Result<TcpStream> {
        let addrs: Vec<_> = tokio::net::lookup_host((config.host.as_str(), config.port))
            .await
            .map_err(|_| TransportError::DnsFailure {
                host: config.host.clone(),
            })?
            .collect();

        if addrs.is_empty() {
            return Err(TransportError::DnsFailure {
                host: config.host.clone(),
            }
            .into());
        }

        let connect_failed = |message: String| TransportError::ConnectTimeout {
            host: config.host.clone(),
            port: config.port,
            message,
        };

        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&addrs[..]))
            .await
            .map_err(|_| connect_failed(format!("timed out after {:?}", config.connect_timeout)))?
            .map_err(|e| connect_failed(e.to_string()))?;

        Ok(stream)
    }

    /// Open an interactive shell channel (PTY + shell) on this connection.
    pub async fn open_shell(&self) -> Result<ChannelStream<Msg>> {
        let session = self.session.as_ref().ok_or(SessionError::NotConnected)?;

        let channel: Channel<Msg> = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "xterm",
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        debug!("{} shell request successful", self.config.socket_addr());
        Ok(channel.into_stream())
    }

    /// Authenticate with password, falling back to keyboard-interactive.
    async fn authenticate(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(SessionError::NotConnected)?;
        let username = self.config.username.clone();
        let password = self.config.password.expose_secret().to_string();
        let auth_error = |e: russh::Error| classify_auth(e, &username);

        let accepted = session
            .authenticate_password(&username, &password)
            .await
            .map_err(auth_error)?
            .success();

        if accepted {
            return Ok(());
        }

        debug!("password auth rejected for '{}', trying keyboard-interactive", username);

        let mut reply = session
            .authenticate_keyboard_interactive_start(&username, None::<String>)
            .await
            .map_err(auth_error)?;

        // Devices ask for the password once; bound the exchange anyway
        for _ in 0..3 {
            match reply {
                KeyboardInteractiveAuthResponse::Success => return Ok(()),
                KeyboardInteractiveAuthResponse::Failure { .. } => break,
                KeyboardInteractiveAuthResponse::InfoRequest { prompts, .. } => {
                    let answers: Vec<String> = prompts.iter().map(|_| password.clone()).collect();
                    reply = session
                        .authenticate_keyboard_interactive_respond(answers)
                        .await
                        .map_err(auth_error)?;
                }
            }
        }

        Err(TransportError::AuthenticationFailed { user: username }.into())
    }

    /// Close the connection.
    ///
    /// Safe to call any number of times.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            session
                .disconnect(russh::Disconnect::ByApplication, "", "en")
                .await
                .map_err(TransportError::Ssh)?;
        }
        Ok(())
    }

    /// Close the connection, logging instead of returning failures.
    pub async fn release(&mut self) {
        if let Err(e) = self.close().await {
            debug!("error while releasing SSH session: {}", e);
        }
    }
}

/// Map a russh handshake failure to a transport error.
fn classify_negotiation(error: russh::Error) -> TransportError {
    match error {
        russh::Error::Disconnect | russh::Error::SendError => TransportError::Negotiation {
            message: "SSH session was lost during negotiation: \
                      try increasing the connect timeout to 15 seconds or larger"
                .to_string(),
            session_lost: true,
        },
        other => TransportError::Negotiation {
            message: format!("SSH negotiation failed: {other}"),
            session_lost: false,
        },
    }
}

/// Map a failure during authentication. Servers often hang up after
/// rejecting credentials; that is reported as an authentication failure.
fn classify_auth(error: russh::Error, user: &str) -> TransportError {
    match error {
        russh::Error::Disconnect => TransportError::AuthenticationFailed {
            user: user.to_string(),
        },
        other => TransportError::Ssh(other),
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key error surfaced by connect().
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let accepted = match self.host_key_verification {
            HostKeyVerification::Disabled => true,

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    true
                }
                Err(e) => self.reject(e),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        };

        Ok(accepted)
    }
}
