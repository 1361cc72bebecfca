use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::schema::WardenConfig;

/// Loads and reloads the warden configuration.
pub struct ConfigLoader {
    config: Arc<RwLock<WardenConfig>>,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > WARDEN_CONFIG env > ~/.warden/warden.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("WARDEN_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".warden")
            .join("warden.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> warden_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            Self::read_file(&config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            WardenConfig::default()
        };

        let config = Self::apply_overrides(config, |key| std::env::var(key).ok());

        // Validate config: log warnings, fail on errors
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(warden_core::WardenError::Config(e));
            }
        }

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    fn read_file(path: &Path) -> warden_core::Result<WardenConfig> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str::<WardenConfig>(&raw).map_err(|e| {
            warden_core::WardenError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Get a read snapshot of the current config.
    pub fn get(&self) -> WardenConfig {
        self.config.read().clone()
    }

    /// Get a shared reference for subscription.
    pub fn shared(&self) -> Arc<RwLock<WardenConfig>> {
        Arc::clone(&self.config)
    }

    /// Path the config was loaded from (or would have been).
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply overrides (WARDEN_PERMISSIONS_FILE, WARDEN_IDENTITY, WARDEN_PLUGIN_DIR,
    /// WARDEN_LOG_LEVEL) looked up through `lookup`, normally the process environment.
    pub fn apply_overrides(
        mut config: WardenConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> WardenConfig {
        if let Some(v) = lookup("WARDEN_PERMISSIONS_FILE") {
            config.sandbox.permissions_file = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Some(v) = lookup("WARDEN_IDENTITY") {
            match v.parse() {
                Ok(strategy) => config.sandbox.identity = strategy,
                Err(e) => warn!(error = %e, "ignoring WARDEN_IDENTITY"),
            }
        }
        if let Some(v) = lookup("WARDEN_PLUGIN_DIR") {
            config.sandbox.plugin_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("WARDEN_LOG_LEVEL") {
            config.logging.level = v;
        }
        config
    }

    /// Reload the config from disk.
    pub fn reload(&self) -> warden_core::Result<()> {
        if !self.config_path.exists() {
            return Err(warden_core::WardenError::Config(format!(
                "config file not found: {}",
                self.config_path.display()
            )));
        }
        let new_config = Self::read_file(&self.config_path)?;
        let new_config = Self::apply_overrides(new_config, |key| std::env::var(key).ok());
        new_config.validate().map_err(warden_core::WardenError::Config)?;
        *self.config.write() = new_config;
        info!("configuration reloaded");
        Ok(())
    }
}
