//! Session lifecycle: connect, prepare, run commands, close.
//!
//! ```text
//!  Unopened ──open()──► Connecting ──► Preparing ──► Ready ──close()──► Closed
//!                           │              │           │
//!                           └──────────────┴───────────┴──► Failed
//! ```
//!
//! A session never hands a half-prepared shell back to the caller: any hard
//! failure after the transport is up disconnects before the error
//! propagates. Prompt detection is best effort and never fails the session.

mod builder;
mod executor;
pub mod prompt;
mod response;
#[cfg(test)]
pub(crate) mod sim;

pub use builder::SessionBuilder;
pub use executor::{Command, DEFAULT_POLL_INTERVAL};
pub use response::CommandResponse;

use std::fmt;
use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::channel::ShellChannel;
use crate::error::{Result, SessionError};
use crate::platform::PlatformDefinition;
use crate::transport::{Connector, SessionConfig, SshConnector};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, never opened.
    Unopened,
    /// Transport connect in progress.
    Connecting,
    /// Transport up, prompt detection and profile setup in progress.
    Preparing,
    /// Accepting commands.
    Ready,
    /// Closed by the caller.
    Closed,
    /// Torn down after an unrecoverable error.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One interactive session with a device.
///
/// Commands run one at a time; every operation takes `&mut self`.
pub struct Session<C: Connector = SshConnector> {
    /// Connection settings, fixed at creation.
    config: SessionConfig,

    /// Vendor markers and setup commands.
    platform: PlatformDefinition,

    /// Produces the shell channel on open.
    connector: C,

    /// Live shell (None when not connected).
    channel: Option<C::Channel>,

    /// Prompt learned during preparation; empty when detection failed.
    prompt: String,

    state: SessionState,
}

impl Session<SshConnector> {
    /// Create an SSH session. Does not connect.
    pub fn new(config: SessionConfig, platform: PlatformDefinition) -> Self {
        Self::with_connector(config, platform, SshConnector)
    }
}

impl<C: Connector> Session<C> {
    /// Create a session that opens its channel through `connector`.
    pub fn with_connector(config: SessionConfig, platform: PlatformDefinition, connector: C) -> Self {
        Self {
            config,
            platform,
            connector,
            channel: None,
            prompt: String::new(),
            state: SessionState::Unopened,
        }
    }

    /// Connect and prepare the session.
    ///
    /// # Errors
    ///
    /// Transport failures are returned as classified by the connector. Hard
    /// failures during preparation (the shell closing, a rejected setup
    /// command) disconnect first and then propagate.
    pub async fn open(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(SessionError::AlreadyConnected.into());
        }

        self.state = SessionState::Connecting;
        self.prompt.clear();
        debug!("connecting to {} over {}", self.config.socket_addr(), self.config.protocol);

        let channel = match self.connector.connect(&self.config).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!("connect to {} failed: {}", self.config.socket_addr(), e);
                self.state = SessionState::Failed;
                return Err(e);
            }
        };
        self.channel = Some(channel);
        self.state = SessionState::Preparing;

        if let Err(e) = self.session_preparation().await {
            warn!("session preparation for {} failed: {}", self.config.socket_addr(), e);
            self.fail().await;
            return Err(e);
        }

        self.state = SessionState::Ready;
        info!(
            "session to {} ready (prompt {:?})",
            self.config.socket_addr(),
            self.prompt
        );
        Ok(())
    }

    /// Drain the login banner, learn the prompt, run the profile commands.
    async fn session_preparation(&mut self) -> Result<()> {
        self.test_channel_read().await?;
        self.set_base_prompt().await;
        self.set_profile().await
    }

    /// Wait for the shell to print its login output and discard it.
    async fn test_channel_read(&mut self) -> Result<()> {
        let settle = self.config.prompt_settle;
        let deadline = Instant::now() + self.config.timeout;
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

        let mut discarded = 0;
        while Instant::now() < deadline && channel.wait_readable(settle).await? {
            discarded += channel.read_available()?.len();
        }
        trace!("discarded {} bytes of login output", discarded);
        Ok(())
    }

    /// Learn the prompt. Failures are logged and leave the prompt empty.
    async fn set_base_prompt(&mut self) {
        let encoding = self.config.encoding;
        let timeout = self.config.timeout;
        let settle = self.config.prompt_settle;
        let Some(channel) = self.channel.as_mut() else {
            return;
        };

        match prompt::detect_prompt(channel, encoding, timeout, settle).await {
            Ok(Some(found)) => {
                debug!("detected prompt {:?}", found);
                self.prompt = found;
            }
            Ok(None) => warn!("failed to obtain prompt, commands need an expect pattern"),
            Err(e) => warn!("failed to obtain prompt: {}", e),
        }
    }

    /// Run the platform's setup commands.
    async fn set_profile(&mut self) -> Result<()> {
        for command in self.platform.on_open_commands.clone() {
            let response = self.send(command.as_str()).await?;
            if let Some(marker) = response.failure_message {
                return Err(SessionError::PreparationFailed {
                    message: format!("device rejected {:?} ({})", command.trim_end(), marker),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Tear down after an unrecoverable error.
    async fn fail(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
        }
        self.state = SessionState::Failed;
    }

    /// Close the session.
    ///
    /// Best effort: teardown failures are logged, never returned, and the
    /// channel is always cleared. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
            debug!("session to {} closed", self.config.socket_addr());
        }
        self.state = SessionState::Closed;
    }

    /// Alias for [`close`](Self::close).
    pub async fn disconnect(&mut self) {
        self.close().await;
    }

    /// The prompt learned during preparation; empty if detection failed.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the session holds a live channel.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::sim::{SimConnector, SimDevice, Step};
    use super::*;
    use crate::error::{Error, TransportError};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn router() -> SimDevice {
        SimDevice::new("router#")
            .banner("\r\nWelcome to the lab\r\n\r\nrouter#")
            .reply(
                "show version",
                [Step::send("show version\r\nVersion 1.0\r\nrouter#")],
            )
    }

    async fn open_session(device: SimDevice) -> (Session<SimConnector>, SimConnector) {
        init_logging();
        let connector = SimConnector::new(device);
        let mut session = SessionBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .timeout(Duration::from_secs(5))
            .prompt_settle(Duration::from_millis(10))
            .build_with(connector.clone())
            .unwrap();
        session.open().await.unwrap();
        (session, connector)
    }

    #[tokio::test]
    async fn test_open_detects_prompt() {
        let (session, _) = open_session(router()).await;
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.prompt(), "router#");
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_show_version_end_to_end() {
        let (mut session, _) = open_session(router()).await;

        let response = session
            .send_command("show version\n", None, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(response.raw, "show version\r\nVersion 1.0\r\nrouter#");
        assert!(response.is_complete());
        assert!(response.elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_pagination_is_transparent() {
        let device = router().reply(
            "show running-config",
            [
                Step::send("show running-config\r\nhostname router\r\n --More-- "),
                Step::AwaitContinuation,
                Step::send("\r\ninterface Gi0/1\r\n --More-- "),
                Step::AwaitContinuation,
                Step::send("\r\n shutdown\r\nrouter#"),
            ],
        );
        let (mut session, _) = open_session(device).await;

        let response = session
            .send_command("show running-config\n", None, Duration::from_millis(20))
            .await
            .unwrap();

        assert!(response.is_complete());
        assert_eq!(response.pages, 2);
        let hostname = response.raw.find("hostname router").unwrap();
        let interface = response.raw.find("interface Gi0/1").unwrap();
        let shutdown = response.raw.find("shutdown").unwrap();
        assert!(hostname < interface && interface < shutdown);
        assert!(response.raw.contains("--More--"));
        assert!(!response.cleaned(&session.platform().pagination).contains("--More--"));
    }

    #[tokio::test]
    async fn test_pagination_requires_space() {
        let device = router().reply(
            "show running-config",
            [
                Step::send("show running-config\r\nhostname router\r\n --More-- "),
                Step::AwaitContinuation,
                Step::send("\r\n shutdown\r\nrouter#"),
            ],
        );
        init_logging();
        let connector = SimConnector::new(device);
        let mut platform = PlatformDefinition::new("pager");
        platform.continuation = "q".to_string();
        let mut session = SessionBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .timeout(Duration::from_secs(2))
            .prompt_settle(Duration::from_millis(10))
            .custom_platform(platform)
            .build_with(connector.clone())
            .unwrap();
        session.open().await.unwrap();

        let err = session
            .send_command("show running-config\n", None, Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(err.is_session_closed());
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_embedded_prompt_does_not_complete() {
        let device = router().reply(
            "show interfaces description",
            [
                Step::send("show interfaces description\r\nGi0/1  uplink-router#1\r\n"),
                Step::Pause(Duration::from_millis(150)),
                Step::send("Gi0/2  spare\r\nrouter#"),
            ],
        );
        let (mut session, _) = open_session(device).await;

        let response = session
            .send_command("show interfaces description\n", None, Duration::from_millis(20))
            .await
            .unwrap();

        assert!(response.is_complete());
        assert!(response.raw.contains("Gi0/2  spare"));
        assert!(response.chunks >= 2);
    }

    #[tokio::test]
    async fn test_timeout_returns_partial_output() {
        init_logging();
        let device = router().reply("show tech", [Step::send("show tech\r\nsection 1\r\n")]);
        let connector = SimConnector::new(device);
        let mut session = SessionBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .timeout(Duration::from_millis(400))
            .prompt_settle(Duration::from_millis(10))
            .build_with(connector)
            .unwrap();
        session.open().await.unwrap();

        let poll = Duration::from_millis(50);
        let response = session.send_command("show tech\n", None, poll).await.unwrap();

        assert!(response.is_timed_out());
        assert_eq!(response.raw, "show tech\r\nsection 1\r\n");
        assert!(response.elapsed >= Duration::from_millis(400));
        assert!(response.elapsed < Duration::from_millis(400) + poll * 4);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_command_variants_fall_through() {
        let device = router().reply(
            "sh firmware",
            [Step::send("sh firmware\r\nFirmware version: 15.2.6\r\nrouter#")],
        );
        let (mut session, _) = open_session(device).await;

        let response = session
            .send_command(
                vec!["show firmware\n", "sh firmware\n"],
                None,
                Duration::from_millis(20),
            )
            .await
            .unwrap();

        assert_eq!(response.command, "sh firmware\n");
        assert!(response.is_success());
        assert!(response.contains("15.2.6"));
    }

    #[tokio::test]
    async fn test_all_variants_rejected_returns_last() {
        let (mut session, _) = open_session(router()).await;

        let response = session
            .send_command(vec!["sh a\n", "sh b\n"], None, Duration::from_millis(20))
            .await
            .unwrap();

        assert_eq!(response.command, "sh b\n");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_expect_pattern_without_prompt() {
        let device = SimDevice::new("")
            .reply("enable", [Step::send("enable\r\nPassword:")]);
        init_logging();
        let connector = SimConnector::new(device);
        let mut session = SessionBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .timeout(Duration::from_millis(300))
            .prompt_settle(Duration::ZERO)
            .build_with(connector)
            .unwrap();

        session.open().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.prompt(), "");

        let response = session
            .send_command("enable\n", Some("[Pp]assword:"), Duration::from_millis(10))
            .await
            .unwrap();
        assert!(response.is_complete());
    }

    #[tokio::test]
    async fn test_device_hangup_fails_session() {
        let device = router().reply(
            "reload",
            [Step::send("reload\r\nSystem going down\r\n"), Step::Hangup],
        );
        let (mut session, connector) = open_session(device).await;

        let err = session
            .send_command("reload\n", None, Duration::from_millis(10))
            .await
            .unwrap_err();

        assert!(err.is_session_closed());
        assert_eq!(session.state(), SessionState::Failed);
        assert!(!session.is_open());
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_propagated() {
        init_logging();
        let connector = SimConnector::failing(|| TransportError::AuthenticationFailed {
            user: "admin".into(),
        });
        let mut session = SessionBuilder::new("192.0.2.1")
            .username("admin")
            .password("wrong")
            .build_with(connector)
            .unwrap();

        let err = session.open().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::AuthenticationFailed { .. })
        ));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn test_preparation_failure_disconnects() {
        let device = router()
            .reply(
                "terminal length 0",
                [Step::send("terminal length 0\r\n% Invalid input\r\nrouter#")],
            );
        init_logging();
        let connector = SimConnector::new(device);
        let platform = PlatformDefinition::new("strict").with_on_open_command("terminal length 0\n");
        let mut session = SessionBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .timeout(Duration::from_secs(2))
            .prompt_settle(Duration::from_millis(10))
            .custom_platform(platform)
            .build_with(connector.clone())
            .unwrap();

        let err = session.open().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::PreparationFailed { .. })
        ));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(!session.is_open());
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_hangup_during_preparation() {
        let device = router().hangup_after_banner();
        init_logging();
        let connector = SimConnector::new(device);
        let mut session = SessionBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .prompt_settle(Duration::from_millis(10))
            .build_with(connector.clone())
            .unwrap();

        let err = session.open().await.unwrap_err();
        assert!(err.is_session_closed());
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut session, connector) = open_session(router()).await;

        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.is_open());

        session.disconnect().await;
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.is_open());
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_open_twice_is_rejected() {
        let (mut session, _) = open_session(router()).await;
        let err = session.open().await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::AlreadyConnected)));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_send_requires_open_session() {
        let connector = SimConnector::new(router());
        let mut session = SessionBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .build_with(connector)
            .unwrap();

        let err = session.send("show version\n").await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::NotConnected)));
        assert_eq!(session.state(), SessionState::Unopened);
    }
}
