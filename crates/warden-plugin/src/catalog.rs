//! The fixed table of grantable capability categories and the grammar of
//! their values.
//!
//! | category           | value grammar                        | grant            |
//! |--------------------|--------------------------------------|------------------|
//! | `files`            | `<action> <target>, <action> <target>` | `FileAccess`     |
//! | `network`          | `<name>, <name>`                     | `NetworkAccess`  |
//! | `policyManagement` | `<name>, <name>`                     | `PolicyManagement` |
//! | `runtime`          | `<name>, <name>`                     | `RuntimeAccess`  |
//!
//! Entries are separated by the literal `", "`. In a `files` entry only the
//! first space separates action from target, so targets may contain spaces.

use warden_core::{
    CapabilityGrant, CapabilityKind, Category, FileAction, GrantParseErrorKind, PluginIdentity,
};

/// Prefix shared by every grant key.
pub const KEY_PREFIX: &str = "permissions.";

/// Separator between entries of one value.
pub const ENTRY_SEPARATOR: &str = ", ";

/// How a category's entries are tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueGrammar {
    /// `<action> <target>`; the target is everything after the first space.
    ActionTarget,
    /// A single name token, granted as the given capability.
    Name(NamedCapability),
}

/// The capabilities whose entries are bare names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedCapability {
    Network,
    PolicyManagement,
    Runtime,
}

impl NamedCapability {
    pub fn grant(self, name: &str) -> CapabilityGrant {
        match self {
            Self::Network => CapabilityGrant::network(name),
            Self::PolicyManagement => CapabilityGrant::policy_management(name),
            Self::Runtime => CapabilityGrant::runtime(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: Category,
    pub kind: CapabilityKind,
    pub grammar: ValueGrammar,
}

pub const CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        category: Category::Files,
        kind: CapabilityKind::FileAccess,
        grammar: ValueGrammar::ActionTarget,
    },
    CatalogEntry {
        category: Category::Network,
        kind: CapabilityKind::NetworkAccess,
        grammar: ValueGrammar::Name(NamedCapability::Network),
    },
    CatalogEntry {
        category: Category::PolicyManagement,
        kind: CapabilityKind::PolicyManagement,
        grammar: ValueGrammar::Name(NamedCapability::PolicyManagement),
    },
    CatalogEntry {
        category: Category::Runtime,
        kind: CapabilityKind::RuntimeAccess,
        grammar: ValueGrammar::Name(NamedCapability::Runtime),
    },
];

/// The catalog row for `category`.
pub fn lookup(category: Category) -> &'static CatalogEntry {
    match category {
        Category::Files => &CATALOG[0],
        Category::Network => &CATALOG[1],
        Category::PolicyManagement => &CATALOG[2],
        Category::Runtime => &CATALOG[3],
    }
}

/// `permissions.<identity>.<category>`
pub fn permission_key(identity: &PluginIdentity, category: Category) -> String {
    format!("{KEY_PREFIX}{identity}.{}", category.token())
}

/// Split a grant key into its identity and category. Identities may contain
/// dots; the category is whatever follows the last one. Returns `None` for
/// keys outside `permissions.` or without a category segment.
pub fn split_key(key: &str) -> Option<(&str, Option<Category>)> {
    let rest = key.strip_prefix(KEY_PREFIX)?;
    let (identity, token) = rest.rsplit_once('.')?;
    Some((identity, Category::from_token(token)))
}

/// The first entry of a value that failed its grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryError {
    pub index: usize,
    pub entry: String,
    pub kind: GrantParseErrorKind,
}

/// Split a value into trimmed entries, paired with their position.
pub fn entries(value: &str) -> impl Iterator<Item = (usize, &str)> {
    value.split(ENTRY_SEPARATOR).map(str::trim).enumerate()
}

impl CatalogEntry {
    /// Parse one trimmed entry into a grant.
    pub fn parse_entry(&self, entry: &str) -> Result<CapabilityGrant, GrantParseErrorKind> {
        if entry.is_empty() {
            return Err(GrantParseErrorKind::EmptyEntry);
        }
        match self.grammar {
            ValueGrammar::ActionTarget => {
                let (action, target) = entry
                    .split_once(' ')
                    .ok_or(GrantParseErrorKind::MissingTarget)?;
                let target = target.trim_start();
                if target.is_empty() {
                    return Err(GrantParseErrorKind::MissingTarget);
                }
                let action: FileAction = action
                    .parse()
                    .map_err(GrantParseErrorKind::UnknownAction)?;
                Ok(CapabilityGrant::file(action, target))
            }
            ValueGrammar::Name(capability) => {
                if entry.chars().any(char::is_whitespace) {
                    return Err(GrantParseErrorKind::UnexpectedField);
                }
                Ok(capability.grant(entry))
            }
        }
    }

    /// Parse a whole value. Stops at the first malformed entry: a value is
    /// either fully understood or contributes nothing.
    pub fn parse_value(&self, value: &str) -> Result<Vec<CapabilityGrant>, EntryError> {
        entries(value)
            .map(|(index, entry)| {
                self.parse_entry(entry).map_err(|kind| EntryError {
                    index,
                    entry: entry.to_string(),
                    kind,
                })
            })
            .collect()
    }
}
