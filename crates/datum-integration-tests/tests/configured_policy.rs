//! Policies loaded from configuration.

use datum_access::{AccessError, Policy};
use datum_config::Config;
use datum_core::Profile;

const POLICY: &str = r#"[
  {
    "title": "pull all datasets",
    "effect": "allow",
    "subject": "*",
    "resources": ["dataset:*"],
    "actions": ["remote:pull"]
  },
  {
    "title": "no pulls from the quarantine",
    "effect": "deny",
    "subject": "*",
    "resources": ["dataset:QmQuarantine:*"],
    "actions": ["remote:pull"]
  }
]"#;

#[test]
fn test_policy_path_from_config() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("policy.json"), POLICY).unwrap();
    std::fs::write(
        home.path().join("config.toml"),
        "[access]\npolicy_path = \"policy.json\"\n",
    )
    .unwrap();

    let resolved = Config::load_with_home(None, home.path()).unwrap();
    let path = resolved.resolve_path(resolved.config.access.policy_path.as_deref().unwrap());
    let policy = Policy::from_file(path).unwrap();
    assert_eq!(policy.len(), 2);

    let bob = Profile::new("QmBob", "bob");
    assert!(policy.enforce(&bob, "dataset:QmAlice:flights", "remote:pull").is_ok());
    assert!(matches!(
        policy.enforce(&bob, "dataset:QmQuarantine:flights", "remote:pull"),
        Err(AccessError::AccessDenied)
    ));
    assert!(matches!(
        policy.enforce(&bob, "dataset:QmAlice:flights", "remote:push"),
        Err(AccessError::AccessDenied)
    ));
}

#[test]
fn test_invalid_policy_file_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("policy.json");
    std::fs::write(&path, r#"[{"effect": "allow", "resources": ["dataset:*"], "actions": ["remote:pull"]}]"#).unwrap();

    assert!(matches!(
        Policy::from_file(&path),
        Err(AccessError::InvalidRule(msg)) if msg == "rule.Subject is required"
    ));
}
