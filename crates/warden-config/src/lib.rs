//! # warden-config
//!
//! Configuration system for warden. Reads from `warden.toml`, then applies
//! environment variable overrides, then CLI flags.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::WardenConfig;
pub use schema::{ConfigWarning, IdentityStrategy, LoggingConfig, SandboxConfig, WarningSeverity};
