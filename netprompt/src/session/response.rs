//! Response type for command execution results.

use std::time::Duration;

use crate::channel::{PaginationMarkers, strip_control, strip_pagination};

/// Raw response from one command invocation.
///
/// `raw` holds every chunk read from the shell in arrival order: the echoed
/// command, pagination banners and the trailing prompt included.
#[derive(Debug, Clone)]
pub struct CommandResponse {
    /// The command text that was sent.
    pub command: String,

    /// The accumulated output, untouched.
    pub raw: String,

    /// Time from sending the command to the end of the read loop.
    pub elapsed: Duration,

    /// Whether the completion pattern was seen before the timeout.
    pub complete: bool,

    /// Number of pagination banners dismissed.
    pub pages: usize,

    /// Number of chunks read.
    pub chunks: usize,

    /// Invalid-command marker found in the output, if any.
    pub failure_message: Option<String>,
}

impl CommandResponse {
    /// Whether the read loop ended on the completion pattern.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether the read loop ran into the timeout.
    pub fn is_timed_out(&self) -> bool {
        !self.complete
    }

    /// Check if the device accepted the command.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Get the raw lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.raw.lines()
    }

    /// Check if the raw output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.raw.contains(pattern)
    }

    /// A copy of the output without control sequences and pagination banners.
    pub fn cleaned(&self, pagination: &PaginationMarkers) -> String {
        strip_pagination(&strip_control(&self.raw), pagination.markers())
    }
}

impl std::fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
