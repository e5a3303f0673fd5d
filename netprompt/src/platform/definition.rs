//! Platform definition for vendor-specific session behavior.

use crate::channel::PaginationMarkers;
use crate::transport::Protocol;

/// Platform definition containing all vendor-specific session settings.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "generic", "datacom_os").
    pub name: String,

    /// Substrings that mark a command as rejected by the device.
    pub invalid_command_markers: Vec<String>,

    /// In-band pagination banners.
    pub pagination: PaginationMarkers,

    /// Keystroke sent to dismiss a pagination banner.
    pub continuation: String,

    /// Protocol used when the caller does not choose one.
    pub default_protocol: Protocol,

    /// Commands run once the prompt is known (profile setup).
    pub on_open_commands: Vec<String>,

    /// Terminal width for the PTY.
    pub terminal_width: u32,

    /// Terminal height for the PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with the common defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invalid_command_markers: vec!["% Invalid".to_string()],
            pagination: PaginationMarkers::default(),
            continuation: " ".to_string(),
            default_protocol: Protocol::Ssh,
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Add an invalid-command marker.
    pub fn with_invalid_marker(mut self, marker: impl Into<String>) -> Self {
        self.invalid_command_markers.push(marker.into());
        self
    }

    /// Replace the pagination markers.
    pub fn with_pagination<I, T>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.pagination = PaginationMarkers::new(markers);
        self
    }

    /// Set the default protocol.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.default_protocol = protocol;
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Rename the definition, used for registry aliases.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The first invalid-command marker present in `output`.
    pub fn find_invalid_marker(&self, output: &str) -> Option<&str> {
        self.invalid_command_markers
            .iter()
            .map(String::as_str)
            .find(|marker| output.contains(*marker))
    }

    /// Whether `output` carries one of the invalid-command markers.
    pub fn is_invalid_command(&self, output: &str) -> bool {
        self.find_invalid_marker(output).is_some()
    }
}
