//! Grant configuration source: a line-oriented `key=value` properties file.
//!
//! The tokenizer works in two passes. Physical lines are first joined into
//! logical lines (comments and blank lines dropped, backslash continuations
//! folded), then each logical line is split into an unescaped key and value.
//! A line that fails to unescape fails the whole load.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use warden_core::{PluginIdentity, Result, WardenError};

use crate::catalog;

/// One `key=value` pair with the line its key started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub value: String,
    /// 1-based line number of the (first physical line of the) entry.
    pub line: usize,
}

/// Ordered mapping from configuration key to raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantConfiguration {
    entries: BTreeMap<String, ConfigEntry>,
}

impl GrantConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text. Fails with [`WardenError::PropertiesSyntax`] on
    /// the first line whose escapes cannot be decoded.
    pub fn parse_str(text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for logical in logical_lines(text) {
            let (key, value) = split_key_value(&logical.text).map_err(|reason| {
                WardenError::PropertiesSyntax {
                    line: logical.line,
                    reason,
                }
            })?;
            entries.insert(
                key,
                ConfigEntry {
                    value,
                    line: logical.line,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every identity named by a `permissions.<identity>.<category>` key with
    /// a known category, sorted and deduplicated.
    pub fn identities(&self) -> Vec<PluginIdentity> {
        let mut ids: Vec<PluginIdentity> = self
            .entries
            .keys()
            .filter_map(|k| catalog::split_key(k))
            .filter(|(_, category)| category.is_some())
            .filter_map(|(identity, _)| PluginIdentity::new(identity))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Keys under `permissions.` whose category is not in the catalog.
    /// They are ignored during resolution.
    pub fn unrecognized_keys(&self) -> Vec<(&str, &ConfigEntry)> {
        self.entries
            .iter()
            .filter(|(k, _)| {
                k.starts_with(catalog::KEY_PREFIX)
                    && !matches!(catalog::split_key(k), Some((id, Some(_))) if !id.is_empty())
            })
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

/// Load the grant configuration from `source`.
///
/// No source, or a source that does not exist, is an empty configuration.
/// A source that exists but cannot be fully read is an error: partial trust
/// data must never be read as "nothing declared". The file is decoded as
/// UTF-8 only; a Latin-1 file with non-ASCII bytes is refused with
/// [`WardenError::ConfigRead`].
pub fn parse(source: Option<&Path>) -> Result<GrantConfiguration> {
    let Some(path) = source else {
        debug!("no permissions file configured, no grants declared");
        return Ok(GrantConfiguration::new());
    };

    match std::fs::read_to_string(path) {
        Ok(text) => {
            let config =
                GrantConfiguration::parse_str(&text).map_err(|e| WardenError::ConfigRead {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            debug!(path = ?path, entries = config.len(), "loaded permissions file");
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = ?path, "permissions file not found, no grants declared");
            Ok(GrantConfiguration::new())
        }
        Err(e) => Err(WardenError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

// ── Tokenizer ──────────────────────────────────────────────────

struct LogicalLine {
    text: String,
    line: usize,
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn logical_lines(text: &str) -> Vec<LogicalLine> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut physical = normalized.split('\n').enumerate();
    let mut out = Vec::new();

    while let Some((idx, raw)) = physical.next() {
        let start = raw.trim_start_matches(is_blank);
        if start.is_empty() || start.starts_with('#') || start.starts_with('!') {
            continue;
        }

        let mut text = start.to_string();
        while continues(&text) {
            text.pop();
            match physical.next() {
                Some((_, next)) => text.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }
        out.push(LogicalLine { text, line: idx + 1 });
    }
    out
}

/// Split a logical line at the first unescaped `=`, `:` or blank.
fn split_key_value(line: &str) -> std::result::Result<(String, String), String> {
    let chars: Vec<char> = line.chars().collect();
    let mut key_end = chars.len();
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }

    let mut value_start = key_end;
    while value_start < chars.len() && is_blank(chars[value_start]) {
        value_start += 1;
    }
    if value_start < chars.len() && (chars[value_start] == '=' || chars[value_start] == ':') {
        value_start += 1;
        while value_start < chars.len() && is_blank(chars[value_start]) {
            value_start += 1;
        }
    }

    let key: String = chars[..key_end].iter().collect();
    let value: String = chars[value_start..].iter().collect();
    Ok((unescape(&key)?, unescape(&value)?))
}

fn unescape(raw: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("malformed \\u escape '\\u{hex}'"))?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
