//! # warden-cli
//!
//! Command-line interface for inspecting plugin grants.
//!
//! ## Commands
//!
//! - `warden identity`: Show the identity an artifact resolves to
//! - `warden resolve`: Show the grants an artifact would receive
//! - `warden check`: Validate a permissions file
//! - `warden audit`: Admit every archive in the plugin directory
//! - `warden config`: Show the effective configuration

pub mod commands;

pub use commands::Cli;
