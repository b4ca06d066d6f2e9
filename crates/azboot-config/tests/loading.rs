use azboot_config::{load_profile, ConfigError};
use azboot_domain::{ScopeLevel, SubjectMode};
use std::io::Write;
use std::path::Path;

fn write_profile(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

#[test]
fn load_valid_fixture() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/azboot.yml");
    let profile = load_profile(&path).expect("should load without error");

    assert_eq!(profile.resource_group.as_deref(), Some("rg-payments"));
    assert_eq!(profile.location.as_deref(), Some("westeurope"));

    let setup = &profile.setup;
    assert_eq!(setup.repository.as_ref().unwrap().to_string(), "contoso/payments");
    assert_eq!(setup.subject_mode, Some(SubjectMode::Environment));
    assert_eq!(setup.subject_value.as_deref(), Some("production"));
    assert_eq!(setup.scope, Some(ScopeLevel::ResourceGroup));
    assert_eq!(
        profile.validate.app_id.as_deref(),
        Some("11111111-2222-3333-4444-555555555555")
    );
}

#[test]
fn partial_profile_leaves_the_rest_unset() {
    let f = write_profile("resource_group: rg-only\n");
    let profile = load_profile(f.path()).unwrap();
    assert_eq!(profile.resource_group.as_deref(), Some("rg-only"));
    assert!(profile.subscription_id.is_none());
    assert!(profile.setup.repository.is_none());
    assert!(profile.validate.app_id.is_none());
}

#[test]
fn empty_file_is_an_empty_profile() {
    let f = write_profile("");
    let profile = load_profile(f.path()).unwrap();
    assert_eq!(profile, Default::default());
}

#[test]
fn invalid_repository_is_rejected() {
    let f = write_profile("setup:\n  repository: not-a-repo\n");
    assert!(matches!(load_profile(f.path()), Err(ConfigError::Domain(_))));
}

#[test]
fn unknown_keys_are_a_parse_error() {
    let f = write_profile("subscription: typo\n");
    assert!(matches!(load_profile(f.path()), Err(ConfigError::YamlParse { .. })));
}

#[test]
fn missing_file_returns_error() {
    let path = Path::new("/nonexistent/path/azboot.yml");
    assert!(matches!(load_profile(path), Err(ConfigError::Io { .. })));
}
