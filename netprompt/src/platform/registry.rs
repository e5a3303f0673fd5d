//! Registry for looking up platform definitions by device type.

use indexmap::IndexMap;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Registry for platform definitions.
///
/// The registry is a plain value: build it once at startup (usually with
/// [`PlatformRegistry::builtin`]), register extra platforms, and hand it to
/// the session builder.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    platforms: IndexMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: IndexMap::new(),
        }
    }

    /// Create a registry holding the built-in platforms.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.insert(vendors::generic::platform());

        let datacom = vendors::datacom::platform();
        // "<name>_ssh" is accepted as an alias of every SSH platform
        registry.insert(datacom.clone().renamed("datacom_os_ssh"));
        registry.insert(datacom);
        registry.insert(vendors::datacom::telnet_platform());
        registry
    }

    fn insert(&mut self, platform: PlatformDefinition) {
        self.platforms.insert(platform.name.clone(), platform);
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: platform.name.clone(),
            }
            .into());
        }
        self.insert(platform);
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Result<&PlatformDefinition> {
        self.platforms.get(name).ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: name.to_string(),
                supported: self.names().join(", "),
            }
            .into()
        })
    }

    /// Check if a platform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// All registered platform names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.platforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
