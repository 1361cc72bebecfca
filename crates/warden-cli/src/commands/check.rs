use std::path::PathBuf;

use tracing::debug;
use warden_config::WardenConfig;
use warden_core::{GrantParseError, WardenError};
use warden_plugin::{GrantResolution, GrantResolver, properties};

use super::permissions_override;

fn error_json(e: &GrantParseError) -> serde_json::Value {
    serde_json::json!({
        "identity": e.identity,
        "category": e.category,
        "line": e.line,
        "index": e.index,
        "entry": e.entry,
        "reason": e.kind.to_string(),
    })
}

pub(super) fn cmd_check(
    mut config: WardenConfig,
    permissions: Option<PathBuf>,
    json: bool,
) -> warden_core::Result<()> {
    permissions_override(&mut config, permissions);
    let path = config.sandbox.permissions_file.ok_or_else(|| {
        WardenError::Config(
            "No permissions file configured. Pass --permissions or set sandbox.permissions_file.".into(),
        )
    })?;

    // The sandbox reads a missing file as "no grants"; here it is a typo to report.
    if !path.exists() {
        return Err(WardenError::ConfigRead {
            path,
            reason: "file not found".into(),
        });
    }

    let grants = properties::parse(Some(path.as_path()))?;
    let resolver = GrantResolver::new();
    let resolutions: Vec<GrantResolution> = grants
        .identities()
        .iter()
        .map(|identity| resolver.resolve(identity, &grants))
        .collect();
    let unrecognized = grants.unrecognized_keys();
    let malformed: usize = resolutions.iter().map(|r| r.errors.len()).sum();
    debug!(path = ?path, identities = resolutions.len(), malformed, "checked permissions file");

    if json {
        let report = serde_json::json!({
            "path": path.display().to_string(),
            "identities": resolutions.iter().map(|r| serde_json::json!({
                "identity": r.identity,
                "grants": r.grants,
                "errors": r.errors.iter().map(error_json).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
            "unrecognized": unrecognized.iter().map(|(key, entry)| serde_json::json!({
                "key": key,
                "line": entry.line,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("🔍 Checking {}", path.display());
        println!();
        if resolutions.is_empty() {
            println!("  No grants declared.");
        }
        for r in &resolutions {
            let mark = if r.is_clean() { "✅" } else { "❌" };
            println!("  {mark} {} — {} grants", r.identity, r.grants.len());
            for e in &r.errors {
                println!("     {e}");
            }
        }
        for (key, entry) in &unrecognized {
            println!("  💡 line {}: '{key}' is not a grant key, ignored", entry.line);
        }
        println!();
        println!(
            "  {} identities, {malformed} malformed, {} ignored keys",
            resolutions.len(),
            unrecognized.len()
        );
    }

    if malformed > 0 {
        return Err(WardenError::Config(format!(
            "{malformed} malformed grant entr{} in {}",
            if malformed == 1 { "y" } else { "ies" },
            path.display()
        )));
    }
    Ok(())
}
