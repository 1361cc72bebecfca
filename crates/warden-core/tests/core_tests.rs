#[cfg(test)]
mod tests {
    use warden_core::*;

    // ── Identity tests ─────────────────────────────────────────

    #[test]
    fn test_identity_rejects_empty() {
        assert!(PluginIdentity::new("").is_none());
        assert_eq!(PluginIdentity::new("alpha").unwrap().as_str(), "alpha");
    }

    #[test]
    fn test_identity_serializes_as_string() {
        let id = PluginIdentity::new("alpha").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alpha\"");
    }

    #[test]
    fn test_location_from_path() {
        let loc = ArtifactLocation::from_path(std::path::Path::new("/opt/plugins/a.jar"));
        assert_eq!(loc.as_str(), "/opt/plugins/a.jar");
        assert_eq!(loc.to_string(), "/opt/plugins/a.jar");
    }

    // ── Grant tests ────────────────────────────────────────────

    #[test]
    fn test_grant_display() {
        assert_eq!(
            CapabilityGrant::file(FileAction::Write, "/c/d e").to_string(),
            "file write /c/d e"
        );
        assert_eq!(CapabilityGrant::network("conn1").to_string(), "network conn1");
        assert_eq!(
            CapabilityGrant::policy_management("getPolicy").to_string(),
            "policy getPolicy"
        );
        assert_eq!(CapabilityGrant::runtime("exitVM").to_string(), "runtime exitVM");
    }

    #[test]
    fn test_grant_json_shape() {
        let grant = CapabilityGrant::file(FileAction::Read, "/a/b");
        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["kind"], "file_access");
        assert_eq!(json["action"], "read");
        assert_eq!(json["target"], "/a/b");
    }

    #[test]
    fn test_grant_set_membership_ignores_insertion_order() {
        let a: GrantSet = [CapabilityGrant::network("x"), CapabilityGrant::runtime("y")]
            .into_iter()
            .collect();
        let b: GrantSet = [CapabilityGrant::runtime("y"), CapabilityGrant::network("x")]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_grant_set_is_default() {
        let set = GrantSet::default();
        assert!(set.is_empty());
        assert!(!set.contains(&CapabilityGrant::network("anything")));
    }

    // ── Error tests ────────────────────────────────────────────

    #[test]
    fn test_identity_error_display() {
        let err = WardenError::IdentityResolution {
            location: "/nope.jar".into(),
            reason: "no such file".into(),
        };
        assert!(err.to_string().contains("/nope.jar"));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn test_grant_parse_error_converts() {
        let parse = GrantParseError {
            identity: "alpha".into(),
            category: Category::Network,
            line: None,
            index: 0,
            entry: String::new(),
            kind: GrantParseErrorKind::EmptyEntry,
        };
        let err: WardenError = parse.clone().into();
        assert_eq!(err.to_string(), parse.to_string());
        assert_eq!(
            parse.to_string(),
            "permissions.alpha.network: entry #0 '': entry is empty"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: WardenError = io.into();
        assert!(matches!(err, WardenError::Io(_)));
    }
}
