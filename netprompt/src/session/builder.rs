//! Builder for creating sessions.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use secrecy::SecretString;

use super::Session;
use crate::channel::Encoding;
use crate::error::{Result, SessionError};
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::transport::{Connector, HostKeyVerification, Protocol, SessionConfig, SessionOptions, SshConnector};

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for TCP connect and SSH negotiation.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default pause after each prompt-detection probe.
pub const DEFAULT_PROMPT_SETTLE: Duration = Duration::from_secs(1);

/// Builder for constructing sessions.
///
/// Explicit settings win over [`SessionOptions`], which win over the
/// platform's defaults.
///
/// # Example
///
/// ```rust,no_run
/// use netprompt::SessionBuilder;
///
/// # async fn example() -> Result<(), netprompt::Error> {
/// let mut session = SessionBuilder::new("192.0.2.10")
///     .username("admin")
///     .password("secret")
///     .platform("datacom_os")
///     .connect()
///     .await?;
///
/// let response = session.send("show version\n").await?;
/// println!("{}", response.raw);
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    secret: Option<String>,
    protocol: Option<Protocol>,
    encoding: Option<Encoding>,
    options: SessionOptions,
    platform_name: Option<String>,
    custom_platform: Option<PlatformDefinition>,
    registry: Option<PlatformRegistry>,
    timeout: Duration,
    connect_timeout: Duration,
    auto_connect: bool,
    prompt_settle: Duration,
    terminal_size: Option<(u32, u32)>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            password: None,
            secret: None,
            protocol: None,
            encoding: None,
            options: SessionOptions::default(),
            platform_name: None,
            custom_platform: None,
            registry: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            auto_connect: true,
            prompt_settle: DEFAULT_PROMPT_SETTLE,
            terminal_size: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the port (default: the protocol's well-known port).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the enable secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Select the protocol.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Apply free-form options.
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the device output encoding (default: UTF-8).
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Set the platform name (e.g., "generic", "datacom_os").
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    /// Set a custom platform definition.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Look platform names up in `registry` instead of the built-in one.
    pub fn registry(mut self, registry: PlatformRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the per-command timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout for TCP connect and SSH negotiation.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Whether [`connect`](Self::connect) opens the session (default: true).
    pub fn auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// Set the pause after each prompt-detection probe.
    pub fn prompt_settle(mut self, settle: Duration) -> Self {
        self.prompt_settle = settle;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_size = Some((width, height));
        self
    }

    /// Set host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a custom known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Resolve the platform and validate the configuration.
    fn resolve(self) -> Result<(SessionConfig, PlatformDefinition)> {
        let platform = match (self.custom_platform, self.platform_name) {
            (Some(custom), _) => custom,
            (None, name) => {
                let name = name.as_deref().unwrap_or("generic");
                let registry = self.registry.unwrap_or_else(PlatformRegistry::builtin);
                registry.get(name)?.clone()
            }
        };

        let protocol = self
            .protocol
            .or(self.options.transport)
            .unwrap_or(platform.default_protocol);

        let port = self
            .port
            .or(self.options.port)
            .unwrap_or_else(|| protocol.default_port());

        let invalid = |message: &str| SessionError::InvalidConfig {
            message: message.to_string(),
        };

        if self.host.trim().is_empty() && protocol != Protocol::Serial {
            return Err(invalid("host is required").into());
        }
        if protocol == Protocol::Ssh && self.username.as_deref().is_none_or(str::is_empty) {
            return Err(invalid("username is required for SSH").into());
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout must be greater than zero").into());
        }

        let (terminal_width, terminal_height) = self
            .terminal_size
            .unwrap_or((platform.terminal_width, platform.terminal_height));

        let config = SessionConfig {
            host: self.host,
            port,
            username: self.username.unwrap_or_default(),
            password: SecretString::from(self.password.unwrap_or_default()),
            secret: self.secret.map(SecretString::from),
            protocol,
            encoding: self.encoding.or(self.options.encoding).unwrap_or_default(),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            auto_connect: self.auto_connect,
            prompt_settle: self.prompt_settle,
            terminal_width,
            terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        debug!(
            "session config for {} resolved: {} platform {:?}",
            config.socket_addr(),
            config.protocol,
            platform.name
        );
        Ok((config, platform))
    }

    /// Build an SSH session without connecting.
    pub fn build(self) -> Result<Session> {
        self.build_with(SshConnector)
    }

    /// Build a session over a custom connector without connecting.
    pub fn build_with<C: Connector>(self, connector: C) -> Result<Session<C>> {
        let (config, platform) = self.resolve()?;
        Ok(Session::with_connector(config, platform, connector))
    }

    /// Build an SSH session and open it unless auto-connect is disabled.
    pub async fn connect(self) -> Result<Session> {
        self.connect_with(SshConnector).await
    }

    /// Build a session over a custom connector and open it unless
    /// auto-connect is disabled.
    pub async fn connect_with<C: Connector>(self, connector: C) -> Result<Session<C>> {
        let mut session = self.build_with(connector)?;
        if session.config().auto_connect {
            session.open().await?;
        }
        Ok(session)
    }
}
