#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use warden_config::{IdentityStrategy, SandboxConfig};
    use warden_core::*;
    use warden_plugin::*;

    fn write_archive(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn write_permissions(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("plugin-permissions.properties");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn sandbox(permissions: Option<PathBuf>, deny_on_malformed: bool) -> PluginSandbox {
        PluginSandbox::new(
            Box::new(PathIdentity::new(FsArtifactStore)),
            SandboxPolicy {
                permissions_file: permissions,
                deny_on_malformed,
            },
        )
    }

    // ── Least privilege ────────────────────────────────────────

    #[test]
    fn test_no_permissions_file_grants_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let artifact = sandbox(None, true)
            .prepare(&ArtifactLocation::from_path(&jar))
            .unwrap();
        assert_eq!(artifact.identity.as_str(), "alpha");
        assert!(artifact.grants.is_empty());
    }

    #[test]
    fn test_missing_permissions_file_grants_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let artifact = sandbox(Some(dir.path().join("absent.properties")), true)
            .prepare(&ArtifactLocation::from_path(&jar))
            .unwrap();
        assert!(artifact.grants.is_empty());
    }

    #[test]
    fn test_blank_permissions_file_grants_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let perms = write_permissions(dir.path(), "\n# nothing declared\n\n");
        let artifact = sandbox(Some(perms), true)
            .prepare(&ArtifactLocation::from_path(&jar))
            .unwrap();
        assert!(artifact.grants.is_empty());
    }

    // ── End-to-end resolution ──────────────────────────────────

    #[test]
    fn test_admit_installs_declared_grants() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "myplugin.jar", b"PK\x03\x04");
        let perms = write_permissions(
            dir.path(),
            "permissions.myplugin.files=read /data/in.txt, write /data/out.txt\n\
             permissions.myplugin.network=conn1\n\
             permissions.other.runtime=exitVM\n",
        );

        let mut domain = MemoryDomain::new();
        let artifact = sandbox(Some(perms), true)
            .admit(&ArtifactLocation::from_path(&jar), &mut domain)
            .unwrap();

        assert_eq!(artifact.grants.len(), 3);
        let id = PluginIdentity::new("myplugin").unwrap();
        assert!(domain.permits(&id, &CapabilityGrant::file(FileAction::Read, "/data/in.txt")));
        assert!(domain.permits(&id, &CapabilityGrant::file(FileAction::Write, "/data/out.txt")));
        assert!(domain.permits(&id, &CapabilityGrant::network("conn1")));
        assert!(!domain.permits(&id, &CapabilityGrant::runtime("exitVM")));
    }

    #[test]
    fn test_jar_url_location_resolves_same_identity() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let perms = write_permissions(dir.path(), "permissions.alpha.runtime=exitVM\n");
        let sb = sandbox(Some(perms), true);

        let by_path = sb.prepare(&ArtifactLocation::from_path(&jar)).unwrap();
        let url = format!("jar:file:{}!/", jar.display());
        let by_url = sb.prepare(&ArtifactLocation::new(url)).unwrap();
        assert_eq!(by_path.identity, by_url.identity);
        assert_eq!(by_path.grants, by_url.grants);
    }

    #[test]
    fn test_permissions_file_is_reread_each_call() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let perms = write_permissions(dir.path(), "permissions.alpha.runtime=exitVM\n");
        let sb = sandbox(Some(perms.clone()), true);
        let loc = ArtifactLocation::from_path(&jar);

        assert_eq!(sb.prepare(&loc).unwrap().grants.len(), 1);
        std::fs::write(&perms, "permissions.alpha.runtime=exitVM, setIO\n").unwrap();
        assert_eq!(sb.prepare(&loc).unwrap().grants.len(), 2);
    }

    // ── Failure policy ─────────────────────────────────────────

    #[test]
    fn test_unreadable_artifact_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = sandbox(None, true)
            .prepare(&ArtifactLocation::from_path(&dir.path().join("gone.jar")))
            .unwrap_err();
        assert!(matches!(err, WardenError::IdentityResolution { .. }));
    }

    #[test]
    fn test_unreadable_permissions_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let perms = dir.path().join("perms.properties");
        std::fs::write(&perms, [b'k', b'=', 0xff, 0xfe]).unwrap();
        let err = sandbox(Some(perms), true)
            .prepare(&ArtifactLocation::from_path(&jar))
            .unwrap_err();
        assert!(matches!(err, WardenError::ConfigRead { .. }));
    }

    #[test]
    fn test_garbled_override_refuses_instead_of_keeping_earlier_grant() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let perms = write_permissions(
            dir.path(),
            "permissions.alpha.files=read /etc/secret\n\
             permissions.alpha.files=read /tmp/only\\uZZZZ\n",
        );
        for strict in [true, false] {
            let mut domain = MemoryDomain::new();
            let err = sandbox(Some(perms.clone()), strict)
                .admit(&ArtifactLocation::from_path(&jar), &mut domain)
                .unwrap_err();
            match err {
                WardenError::ConfigRead { reason, .. } => assert!(reason.starts_with("line 2: ")),
                other => panic!("expected ConfigRead, got {other:?}"),
            }
            assert!(domain.is_empty());
        }
    }

    #[test]
    fn test_strict_policy_refuses_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let perms = write_permissions(
            dir.path(),
            "permissions.alpha.network=\npermissions.alpha.runtime=exitVM\n",
        );
        let mut domain = MemoryDomain::new();
        let err = sandbox(Some(perms), true)
            .admit(&ArtifactLocation::from_path(&jar), &mut domain)
            .unwrap_err();
        match err {
            WardenError::MalformedGrants { identity, errors } => {
                assert_eq!(identity, "alpha");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].category, Category::Network);
            }
            other => panic!("expected MalformedGrants, got {other:?}"),
        }
        assert!(domain.is_empty());
    }

    #[test]
    fn test_lenient_policy_drops_malformed_category() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04");
        let perms = write_permissions(
            dir.path(),
            "permissions.alpha.network=\npermissions.alpha.runtime=exitVM\n",
        );
        let artifact = sandbox(Some(perms), false)
            .prepare(&ArtifactLocation::from_path(&jar))
            .unwrap();
        assert_eq!(artifact.grants.len(), 1);
        assert!(artifact.grants.contains(&CapabilityGrant::runtime("exitVM")));
        assert_eq!(artifact.errors.len(), 1);
        assert_eq!(artifact.errors[0].kind, GrantParseErrorKind::EmptyEntry);
    }

    // ── Digest identity ────────────────────────────────────────

    #[test]
    fn test_digest_identity_survives_rename() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04payload");
        let mut config = SandboxConfig::default();
        config.identity = IdentityStrategy::Digest;

        let sb = PluginSandbox::from_config(&config);
        let before = sb.prepare(&ArtifactLocation::from_path(&jar)).unwrap();

        let renamed = dir.path().join("beta.jar");
        std::fs::rename(&jar, &renamed).unwrap();
        let after = sb.prepare(&ArtifactLocation::from_path(&renamed)).unwrap();
        assert_eq!(before.identity, after.identity);
    }

    #[test]
    fn test_digest_identity_keys_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_archive(dir.path(), "alpha.jar", b"PK\x03\x04payload");
        let digest = DigestIdentity::new(FsArtifactStore)
            .identity(&ArtifactLocation::from_path(&jar))
            .unwrap();
        let perms = write_permissions(
            dir.path(),
            &format!("permissions.{digest}.runtime=exitVM\npermissions.alpha.runtime=setIO\n"),
        );
        let mut config = SandboxConfig::default();
        config.identity = IdentityStrategy::Digest;
        config.permissions_file = Some(perms);

        let artifact = PluginSandbox::from_config(&config)
            .prepare(&ArtifactLocation::from_path(&jar))
            .unwrap();
        let names: Vec<String> = artifact.grants.iter().map(|g| g.to_string()).collect();
        assert_eq!(names, vec!["runtime exitVM"]);
    }

    // ── Audit ──────────────────────────────────────────────────

    #[test]
    fn test_audit_admits_each_archive() {
        let dir = tempfile::tempdir().unwrap();
        let plugins = dir.path().join("plugins");
        std::fs::create_dir(&plugins).unwrap();
        write_archive(&plugins, "alpha.jar", b"PK\x03\x04a");
        write_archive(&plugins, "beta.jar", b"PK\x03\x04b");
        write_archive(&plugins, "notes.txt", b"ignored");
        let perms = write_permissions(
            dir.path(),
            "permissions.alpha.network=conn1\npermissions.beta.files=write\n",
        );

        let mut domain = MemoryDomain::new();
        let entries = sandbox(Some(perms), true)
            .audit(&plugins, "jar", &mut domain)
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].path.ends_with("alpha.jar"));
        assert!(entries[0].outcome.is_ok());
        assert!(entries[1].path.ends_with("beta.jar"));
        assert!(matches!(
            entries[1].outcome,
            Err(WardenError::MalformedGrants { .. })
        ));
        assert_eq!(domain.len(), 1);
    }

    #[test]
    fn test_audit_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut domain = MemoryDomain::new();
        let entries = sandbox(None, true)
            .audit(&dir.path().join("nope"), "jar", &mut domain)
            .unwrap();
        assert!(entries.is_empty());
    }
}
