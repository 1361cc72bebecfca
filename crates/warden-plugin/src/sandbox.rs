use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use warden_config::{IdentityStrategy, SandboxConfig};
use warden_core::{
    ArtifactLocation, CapabilityGrant, GrantParseError, GrantSet, PluginIdentity, Result,
    WardenError,
};

use crate::identity::{DigestIdentity, FsArtifactStore, IdentitySource, PathIdentity};
use crate::properties;
use crate::resolver::GrantResolver;

/// The host's enforcement boundary. Receives each artifact's grant set
/// before any of that artifact's code runs.
pub trait ProtectionDomain {
    fn install(&mut self, identity: &PluginIdentity, grants: &GrantSet) -> Result<()>;
}

/// A [`ProtectionDomain`] that records installed grant sets in memory.
///
/// An identity, once admitted, keeps its grant set: installing a different
/// set for it is rejected, re-installing the same set is a no-op.
#[derive(Debug, Default)]
pub struct MemoryDomain {
    installed: HashMap<PluginIdentity, GrantSet>,
}

impl MemoryDomain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grants_for(&self, identity: &PluginIdentity) -> Option<&GrantSet> {
        self.installed.get(identity)
    }

    /// Whether `identity` was admitted with `grant`. Unknown identities hold nothing.
    pub fn permits(&self, identity: &PluginIdentity, grant: &CapabilityGrant) -> bool {
        self.installed
            .get(identity)
            .is_some_and(|grants| grants.contains(grant))
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}

impl ProtectionDomain for MemoryDomain {
    fn install(&mut self, identity: &PluginIdentity, grants: &GrantSet) -> Result<()> {
        match self.installed.get(identity) {
            Some(existing) if existing != grants => Err(WardenError::DomainInstall {
                identity: identity.to_string(),
                reason: "already admitted with a different grant set".into(),
            }),
            Some(_) => Ok(()),
            None => {
                self.installed.insert(identity.clone(), grants.clone());
                Ok(())
            }
        }
    }
}

/// Where grants come from and how strictly they are read.
#[derive(Debug, Clone)]
pub struct SandboxPolicy {
    pub permissions_file: Option<PathBuf>,
    pub deny_on_malformed: bool,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            permissions_file: None,
            deny_on_malformed: true,
        }
    }
}

/// An artifact whose grant set has been computed.
#[derive(Debug, Clone)]
pub struct SandboxedArtifact {
    pub location: ArtifactLocation,
    pub identity: PluginIdentity,
    pub grants: GrantSet,
    /// Categories dropped under a lenient policy. Always empty when
    /// `deny_on_malformed` is set.
    pub errors: Vec<GrantParseError>,
}

/// Outcome of admitting one artifact during [`PluginSandbox::audit`].
#[derive(Debug)]
pub struct AuditEntry {
    pub path: PathBuf,
    pub outcome: Result<SandboxedArtifact>,
}

/// Computes and installs grant sets for plugin artifacts.
///
/// ```ignore
/// let sandbox = PluginSandbox::from_config(&config.sandbox);
/// let mut domain = MemoryDomain::new();
/// let admitted = sandbox.admit(&ArtifactLocation::new("plugins/alpha.jar"), &mut domain)?;
/// ```
pub struct PluginSandbox {
    identity_source: Box<dyn IdentitySource>,
    resolver: GrantResolver,
    policy: SandboxPolicy,
}

impl PluginSandbox {
    pub fn new(identity_source: Box<dyn IdentitySource>, policy: SandboxPolicy) -> Self {
        Self {
            identity_source,
            resolver: GrantResolver::new(),
            policy,
        }
    }

    pub fn from_config(config: &SandboxConfig) -> Self {
        let identity_source: Box<dyn IdentitySource> = match config.identity {
            IdentityStrategy::Path => Box::new(PathIdentity::new(FsArtifactStore)),
            IdentityStrategy::Digest => Box::new(DigestIdentity::new(FsArtifactStore)),
        };
        Self::new(
            identity_source,
            SandboxPolicy {
                permissions_file: config.permissions_file.clone(),
                deny_on_malformed: config.deny_on_malformed,
            },
        )
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    pub fn identity_source(&self) -> &dyn IdentitySource {
        self.identity_source.as_ref()
    }

    /// Resolve an artifact's identity and grants. The permissions file is
    /// re-read on every call.
    pub fn prepare(&self, location: &ArtifactLocation) -> Result<SandboxedArtifact> {
        let identity = self.identity_source.identity(location)?;
        let config = properties::parse(self.policy.permissions_file.as_deref())?;
        let resolution = self.resolver.resolve(&identity, &config);

        let (grants, errors) = if self.policy.deny_on_malformed {
            (resolution.into_grant_set()?, Vec::new())
        } else {
            for e in &resolution.errors {
                warn!(plugin = %identity, error = %e, "admitting without malformed category");
            }
            (resolution.grants, resolution.errors)
        };

        debug!(plugin = %identity, grants = grants.len(), "prepared artifact");
        Ok(SandboxedArtifact {
            location: location.clone(),
            identity,
            grants,
            errors,
        })
    }

    /// Prepare an artifact and install its grants into `domain`.
    pub fn admit<D: ProtectionDomain + ?Sized>(
        &self,
        location: &ArtifactLocation,
        domain: &mut D,
    ) -> Result<SandboxedArtifact> {
        let artifact = self.prepare(location)?;
        domain.install(&artifact.identity, &artifact.grants)?;
        info!(
            plugin = %artifact.identity,
            grants = artifact.grants.len(),
            source = self.identity_source.name(),
            "admitted plugin"
        );
        Ok(artifact)
    }

    /// Admit every `*.<extension>` file directly inside `dir`, in name order.
    /// A failing artifact is recorded and does not stop the scan.
    pub fn audit<D: ProtectionDomain + ?Sized>(
        &self,
        dir: &Path,
        extension: &str,
        domain: &mut D,
    ) -> Result<Vec<AuditEntry>> {
        if !dir.exists() {
            info!(?dir, "plugin directory does not exist, nothing to audit");
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == extension))
            .collect();
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let outcome = self.admit(&ArtifactLocation::from_path(&path), &mut *domain);
            if let Err(e) = &outcome {
                warn!(path = ?path, error = %e, "plugin refused");
            }
            entries.push(AuditEntry { path, outcome });
        }
        Ok(entries)
    }
}
