//! # warden-plugin
//!
//! Computes, for each plugin artifact, the exact set of capabilities it may
//! exercise, before any of its code runs. Nothing declared means nothing
//! granted.
//!
//! ## Permissions file
//!
//! Grants are declared in a properties file keyed by plugin identity:
//!
//! ```properties
//! permissions.myplugin.files=read /data/in.txt, write /data/out.txt
//! permissions.myplugin.network=connect
//! permissions.myplugin.policyManagement=getPolicy
//! permissions.myplugin.runtime=exitVM
//! ```
//!
//! ## Flow
//!
//! [`IdentitySource`] derives the artifact's identity, [`properties::parse`]
//! loads the file, [`GrantResolver`] applies the [`catalog`] grammar, and
//! [`PluginSandbox`] hands the resulting set to the host's
//! [`ProtectionDomain`].

pub mod catalog;
pub mod identity;
pub mod properties;
pub mod resolver;
pub mod sandbox;

pub use identity::{
    ArtifactStore, DigestIdentity, FsArtifactStore, IdentitySource, PathIdentity,
    identity_from_file_name, resolve_identity,
};
pub use properties::{ConfigEntry, GrantConfiguration, parse};
pub use resolver::{GrantResolution, GrantResolver};
pub use sandbox::{
    AuditEntry, MemoryDomain, PluginSandbox, ProtectionDomain, SandboxPolicy, SandboxedArtifact,
};
