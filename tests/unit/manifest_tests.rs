//! Unit tests for the grant manifest reader
//!
//! These tests read manifests from disk the way the CLI does.

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use mysql_grant_sync::manifest::parse_manifest;
use mysql_grant_sync::model::{Ensure, GrantOptions, Principal};
use mysql_grant_sync::GrantSyncError;

/// Helper to create a temp manifest file with content
fn create_manifest_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".xml").unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_parse_fixture_manifest() {
    let manifest = parse_manifest(&fixture("basic/grants.xml")).unwrap();

    assert_eq!(manifest.engine_version.as_deref(), Some("8.0.36"));
    assert_eq!(manifest.connection.client, Some(PathBuf::from("/usr/bin/mysql")));
    assert_eq!(manifest.grants.len(), 4);

    let app = &manifest.grants[0];
    assert_eq!(app.identity.to_string(), "app@localhost/app.*");
    assert_eq!(
        app.privileges.to_vec(),
        vec!["INSERT", "SELECT", "UPDATE (email, name)"]
    );
    assert_eq!(app.options, Some(GrantOptions::NoGrant));

    assert_eq!(manifest.grants[1].options, None);
    assert_eq!(manifest.grants[2].privileges.to_vec(), vec!["ALL"]);
    assert_eq!(manifest.grants[3].ensure, Ensure::Absent);
}

#[test]
fn test_principals_are_deduplicated() {
    let file = create_manifest_file(
        r#"<GrantManifest>
  <Grant user="app@localhost" table="a.*" privileges="SELECT" />
  <Grant user="app@localhost" table="b.*" privileges="SELECT" />
  <Grant user="other@%" table="a.*" privileges="SELECT" />
</GrantManifest>"#,
    );
    let manifest = parse_manifest(file.path()).unwrap();
    assert_eq!(
        manifest.principals(),
        vec![Principal::new("app", "localhost"), Principal::new("other", "%")]
    );
}

#[test]
fn test_child_elements_instead_of_attributes() {
    let file = create_manifest_file(
        r#"<GrantManifest>
  <Grant>
    <User>app@LocalHost</User>
    <Table>`app`.*</Table>
    <Options>grant</Options>
    <Privilege>all privileges</Privilege>
  </Grant>
</GrantManifest>"#,
    );
    let manifest = parse_manifest(file.path()).unwrap();
    let grant = &manifest.grants[0];
    assert_eq!(grant.identity.to_string(), "app@localhost/app.*");
    assert_eq!(grant.privileges.to_vec(), vec!["ALL"]);
    assert_eq!(grant.options, Some(GrantOptions::WithGrant));
}

#[test]
fn test_missing_file_reports_path() {
    let err = parse_manifest(&PathBuf::from("/nonexistent/grants.xml")).unwrap_err();
    match err.downcast_ref::<GrantSyncError>() {
        Some(GrantSyncError::ManifestReadError { path, .. }) => {
            assert_eq!(path, &PathBuf::from("/nonexistent/grants.xml"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_malformed_xml() {
    let file = create_manifest_file("<GrantManifest><Grant user=\"a@%\"></GrantManifest>");
    let err = parse_manifest(file.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GrantSyncError>(),
        Some(GrantSyncError::ManifestParseError { .. })
    ));
}

#[test]
fn test_invalid_grant_names_the_grant() {
    let file = create_manifest_file(
        r#"<GrantManifest>
  <Grant user="app@localhost" table="app.*" privileges="PROXY, SELECT" />
</GrantManifest>"#,
    );
    let err = parse_manifest(file.path()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "mysql_grant app@localhost/app.*: `privileges` parameter: PROXY can only be specified by itself"
    );
}

#[test]
fn test_invalid_host_rejected() {
    let file = create_manifest_file(
        r#"<GrantManifest>
  <Grant user="app@bad host" table="app.*" privileges="SELECT" />
</GrantManifest>"#,
    );
    let err = parse_manifest(file.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GrantSyncError>(),
        Some(GrantSyncError::InvalidPrincipal { .. })
    ));
}
