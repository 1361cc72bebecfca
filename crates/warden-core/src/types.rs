use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canonical identity of a plugin artifact, e.g. `myplugin` for
/// `/opt/plugins/myplugin.jar`. Computed once per artifact at load time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginIdentity(String);

impl PluginIdentity {
    /// Wrap an already-derived identity. Returns `None` for an empty token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() { None } else { Some(Self(token)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PluginIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Where an artifact was loaded from: a filesystem path (either separator
/// style), a `file:` URL, or a `jar:file:...!/` archive URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactLocation(String);

impl ArtifactLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactLocation {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for ArtifactLocation {
    fn from(p: &Path) -> Self {
        Self::from_path(p)
    }
}
