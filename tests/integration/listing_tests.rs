//! Integration tests for offline planning from saved SHOW GRANTS listings

use pretty_assertions::assert_eq;

use mysql_grant_sync::engine::EngineVersion;
use mysql_grant_sync::manifest::parse_manifest;
use mysql_grant_sync::reconcile::report::{render_grants, render_plan};
use mysql_grant_sync::{parse_listing_file, plan_from_listing, GrantSyncError};

use crate::common::{fixture_path, TestContext};

#[test]
fn test_plan_fixture_from_listing() {
    let manifest = parse_manifest(&fixture_path("basic/grants.xml")).unwrap();
    let plans = plan_from_listing(&manifest, &fixture_path("basic/show_grants.txt"), None).unwrap();

    let statements: Vec<Vec<String>> = plans
        .iter()
        .map(|plan| plan.statements.iter().map(|s| s.sql.clone()).collect())
        .collect();
    assert_eq!(
        statements,
        vec![
            vec![
                "REVOKE DELETE ON `app`.* FROM 'app'@'localhost'".to_string(),
                "FLUSH PRIVILEGES".to_string(),
            ],
            vec![],
            vec![
                "GRANT ALL PRIVILEGES ON *.* TO 'admin'@'localhost' WITH GRANT OPTION".to_string(),
                "FLUSH PRIVILEGES".to_string(),
            ],
            vec![
                "REVOKE GRANT OPTION ON `old`.* FROM 'legacy'@'%'".to_string(),
                "REVOKE ALL PRIVILEGES ON `old`.* FROM 'legacy'@'%'".to_string(),
                "FLUSH PRIVILEGES".to_string(),
            ],
        ]
    );

    let text = render_plan(&plans);
    assert!(text.contains("--- report@%/app.* ---\nOK (in sync)"));
    assert!(text.contains("Summary: 3 to change, 1 in sync"));
}

#[test]
fn test_parse_listing_with_bom_and_crlf() {
    let ctx = TestContext::new();
    let path = ctx.write(
        "grants.txt",
        "\u{feff}GRANT SELECT ON `db`.* TO `u`@`%`\r\nGRANT INSERT ON `db`.* TO `u`@`%`\r\n",
    );

    let grants = parse_listing_file(&path, None).unwrap();
    assert_eq!(render_grants(&grants), "u@%/db.*: INSERT, SELECT (NONE)\n");
}

#[test]
fn test_parse_listing_windows_1252() {
    let ctx = TestContext::new();
    // 0xE9 is 'é' in Windows-1252 and invalid on its own in UTF-8
    let mut bytes = b"GRANT SELECT ON `caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"`.* TO `u`@`%`\n");
    let path = ctx.write("grants.txt", bytes);

    let grants = parse_listing_file(&path, None).unwrap();
    let record = grants.values().next().unwrap();
    assert_eq!(record.identity.scope, "café.*");
}

#[test]
fn test_missing_listing_reports_path() {
    let ctx = TestContext::new();
    let path = ctx.path("missing.txt");

    let err = parse_listing_file(&path, None).unwrap_err();
    match err.downcast_ref::<GrantSyncError>() {
        Some(GrantSyncError::ListingReadError { path: reported, .. }) => assert_eq!(reported, &path),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_version_override_enables_static_collapse() {
    let ctx = TestContext::new();
    let listing = ctx.write(
        "grants.txt",
        "GRANT ALTER, ALTER ROUTINE, CREATE, CREATE ROLE, CREATE ROUTINE, CREATE TABLESPACE, \
         CREATE TEMPORARY TABLES, CREATE USER, CREATE VIEW, DELETE, DROP, DROP ROLE, EVENT, \
         EXECUTE, FILE, INDEX, INSERT, LOCK TABLES, PROCESS, REFERENCES, RELOAD, \
         REPLICATION CLIENT, REPLICATION SLAVE, SELECT, SHOW DATABASES, SHOW VIEW, SHUTDOWN, \
         SUPER, TRIGGER, UPDATE ON *.* TO `root`@`localhost` WITH GRANT OPTION\n",
    );
    let manifest_path = ctx.write(
        "grants.xml",
        r#"<GrantManifest>
  <Grant user="root@localhost" table="*.*" privileges="ALL" options="GRANT" />
</GrantManifest>"#,
    );
    let manifest = parse_manifest(&manifest_path).unwrap();

    let plans = plan_from_listing(&manifest, &listing, Some("8.0.36")).unwrap();
    assert!(plans[0].is_noop());

    let version: EngineVersion = "5.7.44".parse().unwrap();
    let grants = parse_listing_file(&listing, Some(&version)).unwrap();
    assert!(!grants.values().next().unwrap().privileges.has_all());
}
