//! Command execution: send, accumulate, dismiss pagination, stop on the
//! completion pattern or the timeout.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use super::Session;
use super::response::CommandResponse;
use crate::channel::{CompletionPattern, Encoding, ResponseBuffer, ShellChannel};
use crate::error::{ChannelError, Result, SessionError};
use crate::platform::PlatformDefinition;
use crate::transport::Connector;

/// Default delay between reads of a command's output.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A command, or an ordered list of alternative spellings of one command.
///
/// Firmware variants sometimes accept slightly different syntax; with
/// [`Command::Variants`] each spelling is tried in order until one is not
/// rejected by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One command string, sent verbatim.
    Single(String),

    /// Alternatives tried in order.
    Variants(Vec<String>),
}

impl Command {
    /// The command strings in the order they are tried.
    pub fn variants(&self) -> &[String] {
        match self {
            Command::Single(text) => std::slice::from_ref(text),
            Command::Variants(list) => list,
        }
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Command::Single(text.to_string())
    }
}

impl From<String> for Command {
    fn from(text: String) -> Self {
        Command::Single(text)
    }
}

impl From<Vec<String>> for Command {
    fn from(list: Vec<String>) -> Self {
        Command::Variants(list)
    }
}

impl From<Vec<&str>> for Command {
    fn from(list: Vec<&str>) -> Self {
        Command::Variants(list.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Command {
    fn from(list: &[&str]) -> Self {
        Command::Variants(list.iter().map(|s| s.to_string()).collect())
    }
}

impl<C: Connector> Session<C> {
    /// Send a command and return the full raw response.
    ///
    /// The completion pattern is `expect` when given (a regular expression),
    /// otherwise the discovered prompt. The text is sent verbatim, so include
    /// the trailing newline. When the timeout elapses first, the partial
    /// output is returned with [`CommandResponse::is_complete`] set to
    /// `false`; no error is raised.
    ///
    /// # Errors
    ///
    /// Fails when the session is not open, when `expect` is not a valid
    /// regex, or when the shell goes away mid-command. In the last case the
    /// session moves to [`SessionState::Failed`](super::SessionState::Failed)
    /// and its channel is released.
    pub async fn send_command(
        &mut self,
        command: impl Into<Command>,
        expect: Option<&str>,
        poll_interval: Duration,
    ) -> Result<CommandResponse> {
        let command = command.into();
        let (first, rest) = command
            .variants()
            .split_first()
            .ok_or(SessionError::EmptyCommand)?;

        let mut response = self.execute(first, expect, poll_interval).await?;
        for text in rest {
            if response.is_success() {
                break;
            }
            debug!("{:?} rejected by device, trying {:?}", response.command, text);
            response = self.execute(text, expect, poll_interval).await?;
        }
        Ok(response)
    }

    /// Send a command with the default poll interval and the learned prompt.
    pub async fn send(&mut self, command: impl Into<Command>) -> Result<CommandResponse> {
        self.send_command(command, None, DEFAULT_POLL_INTERVAL).await
    }

    /// Send multiple commands sequentially.
    pub async fn send_commands(&mut self, commands: &[&str]) -> Result<Vec<CommandResponse>> {
        let mut responses = Vec::with_capacity(commands.len());
        for cmd in commands {
            responses.push(self.send(*cmd).await?);
        }
        Ok(responses)
    }

    /// Completion pattern for one command, if any is available.
    fn completion_pattern(&self, expect: Option<&str>) -> Result<Option<CompletionPattern>> {
        let pattern = match expect {
            Some(expr) => Some(CompletionPattern::from_expect(expr).map_err(ChannelError::from)?),
            None if !self.prompt.is_empty() => {
                Some(CompletionPattern::from_prompt(&self.prompt).map_err(ChannelError::from)?)
            }
            None => None,
        };
        Ok(pattern)
    }

    /// Run one command string; a dead shell fails the whole session.
    async fn execute(
        &mut self,
        text: &str,
        expect: Option<&str>,
        poll_interval: Duration,
    ) -> Result<CommandResponse> {
        let pattern = self.completion_pattern(expect)?;
        if pattern.is_none() {
            warn!("no prompt known and no expect pattern: {:?} will run until the timeout", text);
        }

        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;
        let result = run_command(
            channel,
            &self.platform,
            self.config.encoding,
            self.config.timeout,
            text,
            pattern.as_ref(),
            poll_interval,
        )
        .await;

        if let Err(ref e) = result {
            if e.is_session_closed() {
                warn!("shell closed while running {:?}: {}", text, e);
                self.fail().await;
            }
        }
        result
    }
}

/// The read loop for a single command.
///
/// Only the newest chunk is checked against the completion pattern. The
/// timeout is checked between reads, so the loop may overrun it by up to one
/// poll interval.
pub(crate) async fn run_command<C: ShellChannel>(
    channel: &mut C,
    platform: &PlatformDefinition,
    encoding: Encoding,
    timeout: Duration,
    text: &str,
    pattern: Option<&CompletionPattern>,
    poll_interval: Duration,
) -> Result<CommandResponse> {
    let start = Instant::now();
    channel.write(text.as_bytes()).await?;

    let mut decoder = encoding.decoder();
    let mut buffer = ResponseBuffer::new();
    let mut pages = 0;
    let mut complete = false;

    loop {
        let elapsed = start.elapsed();
        if elapsed > timeout {
            break;
        }
        if !channel.wait_readable(timeout - elapsed).await? {
            continue;
        }

        let chunk = decoder.decode(&channel.read_available()?);
        if chunk.is_empty() {
            continue;
        }
        trace!("chunk for {:?}: {:?}", text, chunk);

        if let Some(marker) = platform.pagination.find(&chunk) {
            trace!("{:?} banner, sending continuation", marker);
            channel.write(platform.continuation.as_bytes()).await?;
            pages += 1;
        }

        buffer.push(&chunk);

        if let Some(pattern) = pattern {
            if buffer.last_chunk_matches(pattern) {
                complete = true;
                break;
            }
        }

        tokio::time::sleep(poll_interval).await;
    }

    let elapsed = start.elapsed();
    let chunks = buffer.chunk_count();
    let mut raw = buffer.take();
    raw.push_str(&decoder.finish());

    if !complete {
        warn!(
            "{:?} timed out after {:?} waiting for {:?}, returning {} bytes of partial output",
            text,
            elapsed,
            pattern.map(CompletionPattern::source),
            raw.len()
        );
    }

    let failure_message = platform.find_invalid_marker(&raw).map(str::to_string);

    Ok(CommandResponse {
        command: text.to_string(),
        raw,
        elapsed,
        complete,
        pages,
        chunks,
        failure_message,
    })
}
