//! Scripted in-memory device for session tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

use crate::channel::{ShellChannel, StreamChannel};
use crate::error::{Result, TransportError};
use crate::transport::{Connector, SessionConfig};

/// One action of a scripted reply.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Write text to the client.
    Send(String),
    /// Stay silent for a while.
    Pause(Duration),
    /// Block until the client sends a space; any other byte hangs up.
    AwaitContinuation,
    /// Drop the connection.
    Hangup,
}

impl Step {
    pub(crate) fn send(text: &str) -> Self {
        Step::Send(text.to_string())
    }
}

/// A device that answers blank lines with its prompt, known commands with
/// their script, and everything else with an IOS-style rejection.
#[derive(Debug, Clone, Default)]
pub(crate) struct SimDevice {
    prompt: String,
    banner: String,
    replies: Vec<(String, Vec<Step>)>,
    hangup_after_banner: bool,
}

impl SimDevice {
    pub(crate) fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn banner(mut self, banner: &str) -> Self {
        self.banner = banner.to_string();
        self
    }

    pub(crate) fn reply(mut self, command: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.replies.push((command.to_string(), steps.into_iter().collect()));
        self
    }

    pub(crate) fn hangup_after_banner(mut self) -> Self {
        self.hangup_after_banner = true;
        self
    }

    async fn run(self, mut io: DuplexStream) {
        if !self.banner.is_empty() && io.write_all(self.banner.as_bytes()).await.is_err() {
            return;
        }
        if self.hangup_after_banner {
            return;
        }

        while let Some(line) = read_line(&mut io).await {
            if line.is_empty() {
                if !self.prompt.is_empty() {
                    let echo = format!("\r\n{}", self.prompt);
                    if io.write_all(echo.as_bytes()).await.is_err() {
                        return;
                    }
                }
                continue;
            }

            let Some((_, steps)) = self.replies.iter().find(|(command, _)| *command == line) else {
                let rejection = format!(
                    "{}\r\n% Invalid input detected at '^' marker.\r\n{}",
                    line, self.prompt
                );
                if io.write_all(rejection.as_bytes()).await.is_err() {
                    return;
                }
                continue;
            };

            for step in steps {
                match step {
                    Step::Send(text) => {
                        if io.write_all(text.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                    Step::Pause(delay) => tokio::time::sleep(*delay).await,
                    // anything but a single space ends the session
                    Step::AwaitContinuation => match io.read_u8().await {
                        Ok(b' ') => {}
                        _ => return,
                    },
                    Step::Hangup => return,
                }
            }
        }
    }
}

async fn read_line(io: &mut DuplexStream) -> Option<String> {
    let mut line = Vec::new();
    loop {
        match io.read_u8().await {
            Ok(b'\n') => {
                let text = String::from_utf8_lossy(&line);
                return Some(text.trim_end_matches('\r').to_string());
            }
            Ok(byte) => line.push(byte),
            Err(_) => return None,
        }
    }
}

/// Connector that spawns a fresh [`SimDevice`] per connect.
#[derive(Clone)]
pub(crate) struct SimConnector {
    device: SimDevice,
    failure: Option<fn() -> TransportError>,
    closes: Arc<AtomicUsize>,
}

impl SimConnector {
    pub(crate) fn new(device: SimDevice) -> Self {
        Self {
            device,
            failure: None,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A connector whose every connect fails with `failure()`.
    pub(crate) fn failing(failure: fn() -> TransportError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(SimDevice::default())
        }
    }

    /// Number of channel closes so far.
    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Connector for SimConnector {
    type Channel = SimChannel;

    async fn connect(&self, _config: &SessionConfig) -> Result<SimChannel> {
        if let Some(failure) = self.failure {
            return Err(failure().into());
        }
        let (client, server) = duplex(64 * 1024);
        tokio::spawn(self.device.clone().run(server));
        Ok(SimChannel {
            inner: StreamChannel::new(client),
            closes: Arc::clone(&self.closes),
        })
    }
}

pub(crate) struct SimChannel {
    inner: StreamChannel<DuplexStream>,
    closes: Arc<AtomicUsize>,
}

impl ShellChannel for SimChannel {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write(data).await
    }

    fn ready_to_read(&mut self) -> Result<bool> {
        self.inner.ready_to_read()
    }

    async fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        self.inner.wait_readable(timeout).await
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        self.inner.read_available()
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await;
    }
}
