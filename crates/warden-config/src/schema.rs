use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, maps to `warden.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub sandbox: SandboxConfig,
    pub logging: LoggingConfig,
}

// ── Sandbox ────────────────────────────────────────────────────

/// How an artifact's identity is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    /// Archive base name with its extension stripped.
    #[default]
    Path,
    /// Hex BLAKE3 digest of the archive bytes.
    Digest,
}

impl std::str::FromStr for IdentityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "path" => Ok(Self::Path),
            "digest" => Ok(Self::Digest),
            other => Err(format!("unknown identity strategy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Properties file declaring `permissions.<identity>.<category>` grants.
    /// `None` means nothing is declared, so every plugin gets an empty grant set.
    pub permissions_file: Option<PathBuf>,
    /// How plugin identities are derived from artifacts.
    pub identity: IdentityStrategy,
    /// Refuse to admit a plugin whose grants contain a malformed entry.
    /// When false, the malformed category is dropped and the plugin is admitted.
    pub deny_on_malformed: bool,
    /// Directory scanned by `warden audit`.
    pub plugin_dir: PathBuf,
    /// Extension (without the dot) of archives picked up by `warden audit`.
    pub archive_extension: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            permissions_file: None,
            identity: IdentityStrategy::Path,
            deny_on_malformed: true,
            plugin_dir: PathBuf::from("plugins"),
            archive_extension: "jar".into(),
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };
        write!(f, "{}: {}: {}", label, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   hint: {}", h)?;
        }
        Ok(())
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "json", "compact"];

impl WardenConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Permissions file ───
        match &self.sandbox.permissions_file {
            None => warnings.push(ConfigWarning {
                field: "sandbox.permissions_file".into(),
                message: "no permissions file configured, every plugin runs with no grants".into(),
                severity: WarningSeverity::Info,
                hint: Some("Set to e.g. 'plugin-permissions.properties'".into()),
            }),
            Some(path) if !path.exists() => warnings.push(ConfigWarning {
                field: "sandbox.permissions_file".into(),
                message: format!("{} does not exist, every plugin runs with no grants", path.display()),
                severity: WarningSeverity::Warning,
                hint: None,
            }),
            Some(_) => {}
        }

        // ── Malformed entry policy ───
        if !self.sandbox.deny_on_malformed {
            warnings.push(ConfigWarning {
                field: "sandbox.deny_on_malformed".into(),
                message: "plugins with malformed grant entries are admitted with those categories dropped".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set to true to refuse such plugins".into()),
            });
        }

        // ── Archive extension ───
        let ext = &self.sandbox.archive_extension;
        if ext.is_empty() || ext.starts_with('.') {
            warnings.push(ConfigWarning {
                field: "sandbox.archive_extension".into(),
                message: format!("'{}' is not a bare extension", ext),
                severity: WarningSeverity::Error,
                hint: Some("Use e.g. 'jar' (no leading dot)".into()),
            });
        }

        // ── Logging ───
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Error,
                hint: Some(format!("Use one of: {}", LOG_LEVELS.join(", "))),
            });
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Error,
                hint: Some(format!("Use one of: {}", LOG_FORMATS.join(", "))),
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| w.to_string())
            .collect();
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_strategy_parses() {
        assert_eq!("digest".parse::<IdentityStrategy>(), Ok(IdentityStrategy::Digest));
        assert_eq!("PATH".parse::<IdentityStrategy>(), Ok(IdentityStrategy::Path));
        assert!("hash".parse::<IdentityStrategy>().is_err());
    }

    #[test]
    fn default_config_validates_with_info_only() {
        let warnings = WardenConfig::default().validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, WarningSeverity::Info);
        assert_eq!(warnings[0].field, "sandbox.permissions_file");
    }

    #[test]
    fn dotted_extension_is_an_error() {
        let mut config = WardenConfig::default();
        config.sandbox.archive_extension = ".jar".into();
        let err = config.validate().unwrap_err();
        assert!(err.contains("sandbox.archive_extension"));
    }
}
