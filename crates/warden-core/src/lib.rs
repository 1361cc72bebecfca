//! # warden-core
//!
//! Core types and primitives for warden, the grant-resolution layer of a
//! plugin host. This crate defines the shared vocabulary used by every other
//! crate in the workspace: plugin identities, capability grants, grant sets,
//! and the unified error type.

pub mod error;
pub mod grant;
pub mod types;

pub use error::{GrantParseError, GrantParseErrorKind, Result, WardenError};
pub use grant::{CapabilityGrant, CapabilityKind, Category, FileAction, GrantSet};
pub use types::{ArtifactLocation, PluginIdentity};
