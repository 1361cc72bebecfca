use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// A permission category, i.e. the last segment of a
/// `permissions.<identity>.<category>` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Files,
    Network,
    PolicyManagement,
    Runtime,
}

impl Category {
    /// Every category, in the order keys are looked up.
    pub const ALL: [Category; 4] = [
        Category::Files,
        Category::Network,
        Category::PolicyManagement,
        Category::Runtime,
    ];

    /// The token used in configuration keys.
    pub fn token(&self) -> &'static str {
        match self {
            Category::Files => "files",
            Category::Network => "network",
            Category::PolicyManagement => "policyManagement",
            Category::Runtime => "runtime",
        }
    }

    /// Look up a category by its configuration token. Tokens are case-sensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token() == token)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// The kind of capability a grant confers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityKind {
    FileAccess,
    NetworkAccess,
    PolicyManagement,
    RuntimeAccess,
}

/// An operation a [`CapabilityGrant::FileAccess`] grant permits on its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Read,
    Write,
    Execute,
    Delete,
    ReadLink,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Read => "read",
            FileAction::Write => "write",
            FileAction::Execute => "execute",
            FileAction::Delete => "delete",
            FileAction::ReadLink => "readlink",
        }
    }
}

impl FromStr for FileAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(FileAction::Read),
            "write" => Ok(FileAction::Write),
            "execute" => Ok(FileAction::Execute),
            "delete" => Ok(FileAction::Delete),
            "readlink" => Ok(FileAction::ReadLink),
            _ => Err(s.to_string()),
        }
    }
}

impl std::fmt::Display for FileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resolved permission. Immutable once constructed and detached
/// from the configuration it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapabilityGrant {
    FileAccess { action: FileAction, target: String },
    NetworkAccess { name: String },
    PolicyManagement { name: String },
    RuntimeAccess { name: String },
}

impl CapabilityGrant {
    pub fn file(action: FileAction, target: impl Into<String>) -> Self {
        Self::FileAccess {
            action,
            target: target.into(),
        }
    }

    pub fn network(name: impl Into<String>) -> Self {
        Self::NetworkAccess { name: name.into() }
    }

    pub fn policy_management(name: impl Into<String>) -> Self {
        Self::PolicyManagement { name: name.into() }
    }

    pub fn runtime(name: impl Into<String>) -> Self {
        Self::RuntimeAccess { name: name.into() }
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::FileAccess { .. } => CapabilityKind::FileAccess,
            Self::NetworkAccess { .. } => CapabilityKind::NetworkAccess,
            Self::PolicyManagement { .. } => CapabilityKind::PolicyManagement,
            Self::RuntimeAccess { .. } => CapabilityKind::RuntimeAccess,
        }
    }
}

impl std::fmt::Display for CapabilityGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileAccess { action, target } => write!(f, "file {action} {target}"),
            Self::NetworkAccess { name } => write!(f, "network {name}"),
            Self::PolicyManagement { name } => write!(f, "policy {name}"),
            Self::RuntimeAccess { name } => write!(f, "runtime {name}"),
        }
    }
}

/// The grants resolved for one plugin identity.
///
/// Membership is what matters: the set is ordered only so that output and
/// comparisons are deterministic. An empty set grants nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantSet {
    grants: BTreeSet<CapabilityGrant>,
}

impl GrantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grant. Returns `false` if it was already present.
    pub fn insert(&mut self, grant: CapabilityGrant) -> bool {
        self.grants.insert(grant)
    }

    pub fn contains(&self, grant: &CapabilityGrant) -> bool {
        self.grants.contains(grant)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityGrant> {
        self.grants.iter()
    }

    /// Grants of a single kind.
    pub fn of_kind(&self, kind: CapabilityKind) -> impl Iterator<Item = &CapabilityGrant> {
        self.grants.iter().filter(move |g| g.kind() == kind)
    }
}

impl Extend<CapabilityGrant> for GrantSet {
    fn extend<T: IntoIterator<Item = CapabilityGrant>>(&mut self, iter: T) {
        self.grants.extend(iter);
    }
}

impl FromIterator<CapabilityGrant> for GrantSet {
    fn from_iter<T: IntoIterator<Item = CapabilityGrant>>(iter: T) -> Self {
        Self {
            grants: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for GrantSet {
    type Item = CapabilityGrant;
    type IntoIter = std::collections::btree_set::IntoIter<CapabilityGrant>;

    fn into_iter(self) -> Self::IntoIter {
        self.grants.into_iter()
    }
}

impl<'a> IntoIterator for &'a GrantSet {
    type Item = &'a CapabilityGrant;
    type IntoIter = std::collections::btree_set::Iter<'a, CapabilityGrant>;

    fn into_iter(self) -> Self::IntoIter {
        self.grants.iter()
    }
}
