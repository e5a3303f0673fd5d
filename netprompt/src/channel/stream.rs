//! Shell channel over any async byte stream.

use std::time::Duration;

use bytes::BytesMut;
use futures_util::FutureExt;
use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::ShellChannel;
use crate::error::{ChannelError, Result};

/// Largest chunk handed out by a single `read_available` call.
const MAX_CHUNK: usize = 65535;

/// [`ShellChannel`] implementation over an `AsyncRead + AsyncWrite` stream.
///
/// Used for the SSH shell (a russh channel stream) and for in-memory
/// simulated devices.
#[derive(Debug)]
pub struct StreamChannel<S> {
    stream: S,

    /// Bytes received but not yet handed out.
    pending: BytesMut,

    /// Remote side sent EOF.
    eof: bool,
}

impl<S> StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: BytesMut::with_capacity(4096),
            eof: false,
        }
    }

    /// Pull in whatever the stream has ready without waiting.
    fn fill_nonblocking(&mut self) -> Result<usize> {
        if self.eof {
            return Ok(0);
        }

        self.pending.reserve(MAX_CHUNK);
        match self.stream.read_buf(&mut self.pending).now_or_never() {
            None => Ok(0),
            Some(Ok(0)) => {
                debug!("stream channel: remote sent EOF");
                self.eof = true;
                Ok(0)
            }
            Some(Ok(n)) => {
                trace!("stream channel: {} bytes ready", n);
                Ok(n)
            }
            Some(Err(e)) => Err(ChannelError::Io(e).into()),
        }
    }
}

impl<S> ShellChannel for StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.eof {
            return Err(ChannelError::Closed.into());
        }
        self.stream
            .write_all(data)
            .await
            .map_err(ChannelError::Io)?;
        self.stream.flush().await.map_err(ChannelError::Io)?;
        trace!("stream channel: wrote {:?}", String::from_utf8_lossy(data));
        Ok(())
    }

    fn ready_to_read(&mut self) -> Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        self.fill_nonblocking()?;
        if self.pending.is_empty() && self.eof {
            return Err(ChannelError::Closed.into());
        }
        Ok(!self.pending.is_empty())
    }

    async fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        if self.ready_to_read()? {
            return Ok(true);
        }

        self.pending.reserve(MAX_CHUNK);
        match tokio::time::timeout(timeout, self.stream.read_buf(&mut self.pending)).await {
            Err(_) => Ok(false),
            Ok(Ok(0)) => {
                self.eof = true;
                Err(ChannelError::Closed.into())
            }
            Ok(Ok(n)) => {
                trace!("stream channel: {} bytes arrived", n);
                Ok(true)
            }
            Ok(Err(e)) => Err(ChannelError::Io(e).into()),
        }
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        self.fill_nonblocking()?;
        if self.pending.is_empty() && self.eof {
            return Err(ChannelError::Closed.into());
        }
        let n = self.pending.len().min(MAX_CHUNK);
        Ok(self.pending.split_to(n).to_vec())
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("stream channel: shutdown failed: {}", e);
        }
    }
}
