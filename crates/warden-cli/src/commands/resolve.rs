use std::path::PathBuf;

use warden_config::WardenConfig;
use warden_core::ArtifactLocation;
use warden_plugin::PluginSandbox;

use super::permissions_override;

pub(super) fn cmd_resolve(
    mut config: WardenConfig,
    location: String,
    permissions: Option<PathBuf>,
    json: bool,
) -> warden_core::Result<()> {
    permissions_override(&mut config, permissions);
    let sandbox = PluginSandbox::from_config(&config.sandbox);
    let artifact = sandbox.prepare(&ArtifactLocation::new(location))?;

    if json {
        let report = serde_json::json!({
            "location": artifact.location,
            "identity": artifact.identity,
            "grants": artifact.grants,
            "dropped": artifact.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "\x1b[1m{}\x1b[0m ({} grants)",
        artifact.identity,
        artifact.grants.len()
    );
    if artifact.grants.is_empty() {
        println!("  No grants declared.");
    }
    for grant in &artifact.grants {
        println!("  {grant}");
    }
    for e in &artifact.errors {
        println!("  ⚠️  dropped: {e}");
    }
    Ok(())
}
