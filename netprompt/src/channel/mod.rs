//! Channel layer: duplex shell I/O, decoding and completion matching.
//!
//! A [`ShellChannel`] is the live byte stream of one interactive shell. Reads
//! never spin: [`ShellChannel::wait_readable`] parks the task until data
//! arrives or the deadline passes.

mod buffer;
mod cleanup;
mod encoding;
mod patterns;
mod stream;

pub use buffer::ResponseBuffer;
pub use cleanup::{strip_control, strip_pagination};
pub use encoding::{Decoder, Encoding};
pub use patterns::{CompletionPattern, PaginationMarkers, PromptMatcher};
pub use stream::StreamChannel;

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Duplex interactive shell channel, exclusively owned by one session.
pub trait ShellChannel: Send {
    /// Write bytes to the shell.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Non-blocking readiness check.
    ///
    /// Returns `Ok(true)` when [`read_available`](Self::read_available) would
    /// return data right now.
    fn ready_to_read(&mut self) -> Result<bool>;

    /// Wait until data is available or `timeout` elapses.
    ///
    /// Returns `Ok(false)` on timeout. Fails with
    /// [`ChannelError::Closed`](crate::error::ChannelError::Closed) once the
    /// remote side has closed the shell.
    fn wait_readable(&mut self, timeout: Duration) -> impl Future<Output = Result<bool>> + Send;

    /// Return whatever is currently available. May be empty; never blocks.
    fn read_available(&mut self) -> Result<Vec<u8>>;

    /// Tear the channel down. Failures are logged, never returned.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
