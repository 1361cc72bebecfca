use tracing::{debug, warn};
use warden_core::{Category, GrantParseError, GrantSet, PluginIdentity, Result, WardenError};

use crate::catalog::{self, permission_key};
use crate::properties::GrantConfiguration;

/// Outcome of resolving one identity against a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantResolution {
    pub identity: PluginIdentity,
    pub grants: GrantSet,
    /// At most one error per category; a category with an error contributed no grants.
    pub errors: Vec<GrantParseError>,
}

impl GrantResolution {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The grant set, or [`WardenError::MalformedGrants`] if any category
    /// failed to parse.
    pub fn into_grant_set(self) -> Result<GrantSet> {
        if self.errors.is_empty() {
            Ok(self.grants)
        } else {
            Err(WardenError::MalformedGrants {
                identity: self.identity.to_string(),
                errors: self.errors,
            })
        }
    }
}

/// Turns a [`GrantConfiguration`] into the grants of one identity.
///
/// Stateless: every call re-derives the result from its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantResolver;

impl GrantResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, identity: &PluginIdentity, config: &GrantConfiguration) -> GrantResolution {
        let mut grants = GrantSet::new();
        let mut errors = Vec::new();

        if config.is_empty() {
            return GrantResolution {
                identity: identity.clone(),
                grants,
                errors,
            };
        }

        for category in Category::ALL {
            let key = permission_key(identity, category);
            let Some(entry) = config.get(&key) else {
                continue;
            };

            match catalog::lookup(category).parse_value(&entry.value) {
                Ok(parsed) => {
                    debug!(plugin = %identity, %category, count = parsed.len(), "resolved grants");
                    grants.extend(parsed);
                }
                Err(e) => {
                    let error = GrantParseError {
                        identity: identity.to_string(),
                        category,
                        line: Some(entry.line),
                        index: e.index,
                        entry: e.entry,
                        kind: e.kind,
                    };
                    warn!(plugin = %identity, %category, error = %error, "malformed grant entry, category dropped");
                    errors.push(error);
                }
            }
        }

        GrantResolution {
            identity: identity.clone(),
            grants,
            errors,
        }
    }
}
