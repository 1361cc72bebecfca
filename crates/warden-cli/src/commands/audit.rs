use std::path::PathBuf;

use warden_config::WardenConfig;
use warden_plugin::{MemoryDomain, PluginSandbox};

pub(super) fn cmd_audit(config: WardenConfig, dir: Option<PathBuf>, json: bool) -> warden_core::Result<()> {
    let dir = dir.unwrap_or_else(|| config.sandbox.plugin_dir.clone());
    let sandbox = PluginSandbox::from_config(&config.sandbox);
    let mut domain = MemoryDomain::new();
    let entries = sandbox.audit(&dir, &config.sandbox.archive_extension, &mut domain)?;

    if json {
        let report: Vec<serde_json::Value> = entries
            .iter()
            .map(|entry| match &entry.outcome {
                Ok(artifact) => serde_json::json!({
                    "path": entry.path.display().to_string(),
                    "admitted": true,
                    "identity": artifact.identity,
                    "grants": artifact.grants,
                }),
                Err(e) => serde_json::json!({
                    "path": entry.path.display().to_string(),
                    "admitted": false,
                    "error": e.to_string(),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!(
            "No *.{} archives in {}.",
            config.sandbox.archive_extension,
            dir.display()
        );
        return Ok(());
    }

    let mut refused = 0;
    for entry in &entries {
        match &entry.outcome {
            Ok(artifact) => {
                println!(
                    "  ✅ {} — {} grants",
                    artifact.identity,
                    artifact.grants.len()
                );
                for grant in &artifact.grants {
                    println!("     {grant}");
                }
            }
            Err(e) => {
                refused += 1;
                println!("  ❌ {} — {e}", entry.path.display());
            }
        }
    }
    println!();
    println!(
        "  {} admitted, {refused} refused",
        entries.len() - refused
    );
    Ok(())
}
