//! Artifact identity resolution.
//!
//! An [`IdentitySource`] turns an artifact's load location into the
//! [`PluginIdentity`] its grants are keyed by. Two sources ship here:
//! [`PathIdentity`] (archive base name, extension stripped) and
//! [`DigestIdentity`] (BLAKE3 of the archive bytes, stable across renames).

use std::io::Read;
use std::path::PathBuf;
use tracing::debug;
use url::Url;
use warden_core::{ArtifactLocation, PluginIdentity, Result, WardenError};

const UNIX_SEPARATOR: char = '/';
const WINDOWS_SEPARATOR: char = '\\';

/// Length, in characters, of the archive suffix stripped from file names (`.jar`).
pub const ARCHIVE_SUFFIX_LEN: usize = 4;

fn identity_error(location: &ArtifactLocation, reason: impl Into<String>) -> WardenError {
    WardenError::IdentityResolution {
        location: location.to_string(),
        reason: reason.into(),
    }
}

/// Opens artifact locations. Implemented by the host's artifact storage.
pub trait ArtifactStore: Send + Sync {
    /// The archive's canonical file name, as opened (may include directories).
    fn file_name(&self, location: &ArtifactLocation) -> Result<String>;

    /// The archive's full contents.
    fn read(&self, location: &ArtifactLocation) -> Result<Vec<u8>>;
}

/// Derives a [`PluginIdentity`] for an artifact.
pub trait IdentitySource: Send + Sync {
    fn name(&self) -> &str;
    fn identity(&self, location: &ArtifactLocation) -> Result<PluginIdentity>;
}

/// [`ArtifactStore`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactStore;

impl FsArtifactStore {
    /// Map a location onto a local path. Accepts plain paths, `file:` URLs
    /// and `jar:<file url>!/...` archive URLs.
    pub fn local_path(location: &ArtifactLocation) -> Result<PathBuf> {
        let raw = location.as_str().trim();
        if raw.is_empty() {
            return Err(identity_error(location, "empty location"));
        }

        let Ok(url) = Url::parse(raw) else {
            return Ok(PathBuf::from(raw));
        };

        match url.scheme() {
            "file" => url
                .to_file_path()
                .map_err(|_| identity_error(location, "file URL does not name a local path")),
            "jar" => {
                // jar:<inner>!/<entry>; only the archive itself matters here.
                let inner = url.path();
                let inner = inner.split_once("!/").map_or(inner, |(archive, _)| archive);
                let inner = inner.strip_suffix('!').unwrap_or(inner);
                Self::local_path(&ArtifactLocation::new(inner))
            }
            // A drive letter (`C:\plugins\a.jar`) parses as a one-letter scheme.
            scheme if scheme.len() == 1 => Ok(PathBuf::from(raw)),
            scheme => Err(identity_error(
                location,
                format!("cannot open '{scheme}' location as an archive"),
            )),
        }
    }

    fn open(location: &ArtifactLocation) -> Result<(PathBuf, std::fs::File)> {
        let path = Self::local_path(location)?;
        let file = std::fs::File::open(&path)
            .map_err(|e| identity_error(location, format!("cannot read archive: {e}")))?;
        let meta = file
            .metadata()
            .map_err(|e| identity_error(location, format!("cannot read archive: {e}")))?;
        if !meta.is_file() {
            return Err(identity_error(location, "not a regular file"));
        }
        Ok((path, file))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn file_name(&self, location: &ArtifactLocation) -> Result<String> {
        let (path, _) = Self::open(location)?;
        path.to_str()
            .map(str::to_string)
            .ok_or_else(|| identity_error(location, "archive name is not valid UTF-8"))
    }

    fn read(&self, location: &ArtifactLocation) -> Result<Vec<u8>> {
        let (_, mut file) = Self::open(location)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| identity_error(location, format!("cannot read archive: {e}")))?;
        Ok(bytes)
    }
}

/// Base-name rule: keep what follows the last `/` or `\`, then drop the
/// archive suffix. Independent of the host's own separator convention.
pub fn identity_from_file_name(file_name: &str) -> Option<PluginIdentity> {
    let base = match file_name.rfind([UNIX_SEPARATOR, WINDOWS_SEPARATOR]) {
        Some(idx) => &file_name[idx + 1..],
        None => file_name,
    };
    let keep = base.chars().count().checked_sub(ARCHIVE_SUFFIX_LEN)?;
    let stem: String = base.chars().take(keep).collect();
    PluginIdentity::new(stem)
}

/// Identity from the archive's base name.
#[derive(Debug, Clone, Default)]
pub struct PathIdentity<S = FsArtifactStore> {
    store: S,
}

impl<S: ArtifactStore> PathIdentity<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ArtifactStore> IdentitySource for PathIdentity<S> {
    fn name(&self) -> &str {
        "path"
    }

    fn identity(&self, location: &ArtifactLocation) -> Result<PluginIdentity> {
        let file_name = self.store.file_name(location)?;
        let identity = identity_from_file_name(&file_name).ok_or_else(|| {
            identity_error(location, format!("'{file_name}' leaves no name once the archive suffix is stripped"))
        })?;
        debug!(%location, plugin = %identity, "resolved path identity");
        Ok(identity)
    }
}

/// Identity from the lowercase hex BLAKE3 digest of the archive bytes.
#[derive(Debug, Clone, Default)]
pub struct DigestIdentity<S = FsArtifactStore> {
    store: S,
}

impl<S: ArtifactStore> DigestIdentity<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ArtifactStore> IdentitySource for DigestIdentity<S> {
    fn name(&self) -> &str {
        "digest"
    }

    fn identity(&self, location: &ArtifactLocation) -> Result<PluginIdentity> {
        let bytes = self.store.read(location)?;
        let digest = blake3::hash(&bytes).to_hex().to_string();
        let identity =
            PluginIdentity::new(digest).ok_or_else(|| identity_error(location, "empty digest"))?;
        debug!(%location, plugin = %identity, "resolved digest identity");
        Ok(identity)
    }
}

/// Resolve an artifact's identity from its base name on the local filesystem.
pub fn resolve_identity(location: &ArtifactLocation) -> Result<PluginIdentity> {
    PathIdentity::new(FsArtifactStore).identity(location)
}
