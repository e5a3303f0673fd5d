//! Pattern matching for command completion and pagination.

use memchr::memmem::Finder;
use regex::Regex;

/// Trait for completion matching, extensible for custom matchers.
pub trait PromptMatcher: Send + Sync {
    /// Returns byte offset where the match ends, or None if no match.
    fn find_match(&self, data: &str) -> Option<usize>;

    /// Check if the data matches.
    fn is_match(&self, data: &str) -> bool {
        self.find_match(data).is_some()
    }
}

/// Completion sentinel for one command.
///
/// The sentinel must sit at the end of a line of output: at least one
/// non-whitespace run, optional whitespace, the pattern, then only trailing
/// whitespace before the end of the chunk. A prompt string buried inside
/// other text (an interface description, the echoed command) does not match.
#[derive(Debug, Clone)]
pub struct CompletionPattern {
    regex: Regex,
    source: String,
}

impl CompletionPattern {
    /// Build from a discovered prompt, matched literally.
    pub fn from_prompt(prompt: &str) -> Result<Self, regex::Error> {
        Self::anchored(&regex::escape(prompt), prompt)
    }

    /// Build from a caller-supplied regular expression.
    pub fn from_expect(pattern: &str) -> Result<Self, regex::Error> {
        Self::anchored(pattern, pattern)
    }

    fn anchored(body: &str, source: &str) -> Result<Self, regex::Error> {
        let expr = if body.ends_with('$') && !body.ends_with("\\$") {
            format!(r"\S+\s*(?:{body})")
        } else {
            format!(r"\S+\s*(?:{body})\s*$")
        };
        Ok(Self {
            regex: Regex::new(&expr)?,
            source: source.to_string(),
        })
    }

    /// The pattern as given by the caller or the prompt detector.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl PromptMatcher for CompletionPattern {
    fn find_match(&self, data: &str) -> Option<usize> {
        self.regex.find(data).map(|m| m.end())
    }
}

/// Literal in-band pagination banners such as `--More--`.
#[derive(Debug, Clone)]
pub struct PaginationMarkers {
    markers: Vec<String>,
    finders: Vec<Finder<'static>>,
}

impl PaginationMarkers {
    /// Create a marker set.
    pub fn new<I, T>(markers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let markers: Vec<String> = markers
            .into_iter()
            .map(Into::into)
            .filter(|m| !m.is_empty())
            .collect();
        let finders = markers
            .iter()
            .map(|m| Finder::new(m.as_bytes()).into_owned())
            .collect();
        Self { markers, finders }
    }

    /// Return the first marker present in `chunk`.
    pub fn find(&self, chunk: &str) -> Option<&str> {
        self.finders
            .iter()
            .zip(&self.markers)
            .find(|(finder, _)| finder.find(chunk.as_bytes()).is_some())
            .map(|(_, marker)| marker.as_str())
    }

    /// The configured markers.
    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl Default for PaginationMarkers {
    fn default() -> Self {
        Self::new(["--More--", "(END)"])
    }
}
