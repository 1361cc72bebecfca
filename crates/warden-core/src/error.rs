use std::path::PathBuf;
use thiserror::Error;

use crate::grant::Category;

/// Unified error type for the entire warden runtime.
#[derive(Error, Debug)]
pub enum WardenError {
    // ── Identity errors ────────────────────────────────────────
    #[error("cannot resolve plugin identity for {location}: {reason}")]
    IdentityResolution { location: String, reason: String },

    // ── Permission source errors ───────────────────────────────
    #[error("cannot read permissions file {}: {reason}", path.display())]
    ConfigRead { path: PathBuf, reason: String },

    #[error("line {line}: {reason}")]
    PropertiesSyntax { line: usize, reason: String },

    #[error(transparent)]
    GrantParse(#[from] GrantParseError),

    #[error("plugin {identity} refused: {}", refusal_detail(errors))]
    MalformedGrants {
        identity: String,
        errors: Vec<GrantParseError>,
    },

    // ── Sandbox errors ─────────────────────────────────────────
    #[error("protection domain rejected grants for {identity}: {reason}")]
    DomainInstall { identity: String, reason: String },

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WardenError>;

fn refusal_detail(errors: &[GrantParseError]) -> String {
    let count = errors.len();
    let list: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!(
        "{count} malformed grant entr{}: {}",
        if count == 1 { "y" } else { "ies" },
        list.join("; ")
    )
}

/// Why a single grant entry failed its category's grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantParseErrorKind {
    /// The entry is empty (e.g. `permissions.alpha.network=`).
    EmptyEntry,
    /// A `files` entry has no target after its action.
    MissingTarget,
    /// A `files` entry names an action outside the known set.
    UnknownAction(String),
    /// A name entry carries more than one whitespace-separated field.
    UnexpectedField,
}

impl std::fmt::Display for GrantParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEntry => write!(f, "entry is empty"),
            Self::MissingTarget => write!(f, "expected '<action> <target>', target is missing"),
            Self::UnknownAction(action) => write!(
                f,
                "unknown file action '{action}' (expected read, write, execute, delete or readlink)"
            ),
            Self::UnexpectedField => write!(f, "expected a single name, found extra fields"),
        }
    }
}

/// A single configuration entry that does not match its category's grammar.
///
/// Scoped to one identity and one category: it never invalidates other
/// categories or other identities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("permissions.{identity}.{}{}: entry #{index} '{entry}': {kind}", category.token(), line.map(|l| format!(" (line {l})")).unwrap_or_default())]
pub struct GrantParseError {
    pub identity: String,
    pub category: Category,
    /// 1-based line of the key in the permissions file, when known.
    pub line: Option<usize>,
    /// 0-based position of the entry within the comma-separated value.
    pub index: usize,
    pub entry: String,
    pub kind: GrantParseErrorKind,
}
