use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use warden_config::{ConfigLoader, IdentityStrategy, WardenConfig};
use warden_core::{ArtifactLocation, WardenError};
use warden_plugin::PluginSandbox;

mod audit;
mod check;
mod resolve;

/// Warden: least-privilege capability grants for plugin artifacts
#[derive(Parser, Debug)]
#[command(name = "warden", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to warden.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the identity an artifact resolves to
    Identity {
        /// Artifact path, file: URL or jar: URL
        location: String,
        /// Use the content digest instead of the file name
        #[arg(long)]
        digest: bool,
    },
    /// Show the grants an artifact would receive
    Resolve {
        /// Artifact path, file: URL or jar: URL
        location: String,
        /// Permissions file (overrides sandbox.permissions_file)
        #[arg(short, long)]
        permissions: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a permissions file and report every malformed entry
    Check {
        /// Permissions file (overrides sandbox.permissions_file)
        #[arg(short, long)]
        permissions: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Admit every archive in the plugin directory and report the outcome
    Audit {
        /// Directory to scan (defaults to sandbox.plugin_dir)
        dir: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub fn run(self) -> warden_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        };
        init_tracing(log_level, &config.logging.format);

        match self.command {
            Commands::Identity { location, digest } => Self::cmd_identity(config, location, digest),
            Commands::Resolve {
                location,
                permissions,
                json,
            } => resolve::cmd_resolve(config, location, permissions, json),
            Commands::Check { permissions, json } => check::cmd_check(config, permissions, json),
            Commands::Audit { dir, json } => audit::cmd_audit(config, dir, json),
            Commands::Config { json } => Self::cmd_config(config, json),
            Commands::Completions { shell } => Self::cmd_completions(shell),
        }
    }

    fn cmd_identity(mut config: WardenConfig, location: String, digest: bool) -> warden_core::Result<()> {
        if digest {
            config.sandbox.identity = IdentityStrategy::Digest;
        }
        let sandbox = PluginSandbox::from_config(&config.sandbox);
        let identity = sandbox
            .identity_source()
            .identity(&ArtifactLocation::new(location))?;
        println!("{identity}");
        Ok(())
    }

    fn cmd_config(config: WardenConfig, json: bool) -> warden_core::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| WardenError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> warden_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "warden", &mut std::io::stdout());
        Ok(())
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(level: &str, format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        "json" => builder.json().with_target(true).init(),
        "compact" => builder.compact().with_target(false).init(),
        _ => builder.with_target(false).init(),
    }
}

/// Resolve the permissions file: `--permissions` wins over the config.
fn permissions_override(config: &mut WardenConfig, permissions: Option<PathBuf>) {
    if let Some(path) = permissions {
        config.sandbox.permissions_file = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_resolve_with_globals() {
        let cli = Cli::try_parse_from([
            "warden",
            "resolve",
            "plugins/alpha.jar",
            "--permissions",
            "perms.properties",
            "--json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Resolve {
                location,
                permissions,
                json,
            } => {
                assert_eq!(location, "plugins/alpha.jar");
                assert_eq!(permissions, Some(PathBuf::from("perms.properties")));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["warden", "-v", "-q", "config"]).is_err());
    }

    #[test]
    fn audit_dir_is_optional() {
        let cli = Cli::try_parse_from(["warden", "audit"]).unwrap();
        assert!(matches!(cli.command, Commands::Audit { dir: None, json: false }));
    }

    #[test]
    fn identity_requires_location() {
        assert!(Cli::try_parse_from(["warden", "identity"]).is_err());
        let cli = Cli::try_parse_from(["warden", "identity", "a.jar", "--digest"]).unwrap();
        assert!(matches!(cli.command, Commands::Identity { digest: true, .. }));
    }

    #[test]
    fn permissions_flag_overrides_config() {
        let mut config = WardenConfig::default();
        config.sandbox.permissions_file = Some(PathBuf::from("from-config.properties"));
        permissions_override(&mut config, None);
        assert_eq!(
            config.sandbox.permissions_file,
            Some(PathBuf::from("from-config.properties"))
        );
        permissions_override(&mut config, Some(PathBuf::from("flag.properties")));
        assert_eq!(
            config.sandbox.permissions_file,
            Some(PathBuf::from("flag.properties"))
        );
    }
}
