//! Unit tests for SHOW GRANTS listing parsing
//!
//! These tests feed whole listings, as the engine prints them, through the
//! public parser API.

use mysql_grant_sync::engine::EngineVersion;
use mysql_grant_sync::model::privilege_catalog::STATIC_PRIVILEGE_CATALOGS;
use mysql_grant_sync::model::{GrantIdentity, GrantOptions, GrantRecord, Principal, PrivilegeSet};
use mysql_grant_sync::parser::{tokenize_line, GrantParser, ParsedLine};

fn parse(listing: &str) -> Vec<GrantRecord> {
    GrantParser::default().parse(listing).into_values().collect()
}

fn privileges(record: &GrantRecord) -> Vec<String> {
    record.privileges.to_vec()
}

// ============================================================================
// Line Tokenizing Tests
// ============================================================================

#[test]
fn test_banner_and_blank_lines_are_skipped() {
    assert_eq!(tokenize_line(""), ParsedLine::Skipped);
    assert_eq!(tokenize_line("Grants for app@localhost"), ParsedLine::Skipped);
    assert_eq!(
        tokenize_line("mysql: [Warning] Using a password on the command line interface can be insecure."),
        ParsedLine::Skipped
    );
}

#[test]
fn test_crlf_line_endings() {
    let records = parse("GRANT SELECT ON `db`.* TO `u`@`%`\r\nGRANT INSERT ON `db`.* TO `u`@`%`\r\n");
    assert_eq!(records.len(), 1);
    assert_eq!(privileges(&records[0]), vec!["INSERT", "SELECT"]);
}

#[test]
fn test_user_containing_at_sign() {
    let records = parse("GRANT SELECT ON `db`.* TO `ops@corp`@`10.0.0.%`");
    assert_eq!(records[0].identity.principal, Principal::new("ops@corp", "10.0.0.%"));
}

#[test]
fn test_host_ends_at_first_whitespace() {
    let records = parse("GRANT USAGE ON *.* TO 'u'@'%' IDENTIFIED BY PASSWORD '*ABC' WITH GRANT OPTION");
    assert_eq!(records[0].identity.principal.host, "%");
    assert_eq!(records[0].options, GrantOptions::WithGrant);
}

// ============================================================================
// Normalization Tests
// ============================================================================

#[test]
fn test_all_privileges_becomes_all() {
    let records = parse("GRANT ALL PRIVILEGES ON `db`.* TO `u`@`%`");
    assert_eq!(privileges(&records[0]), vec!["ALL"]);
}

#[test]
fn test_column_privileges_sorted_and_deduplicated() {
    let records = parse("GRANT SELECT (`b`, `a`, `a`), INSERT (`c`) ON `db`.`t` TO `u`@`%`");
    assert_eq!(privileges(&records[0]), vec!["INSERT (c)", "SELECT (a, b)"]);
    assert_eq!(records[0].identity.scope, "db.t");
}

#[test]
fn test_escaped_underscore_in_database() {
    let records = parse(r"GRANT SELECT ON `my\\_db`.* TO `u`@`%`");
    assert_eq!(records[0].identity.scope, r"my\_db.*");
}

#[test]
fn test_routine_scope() {
    let records = parse("GRANT EXECUTE ON PROCEDURE `db`.`cleanup` TO `u`@`%`");
    assert_eq!(records[0].identity.scope, "PROCEDURE db.cleanup");
    assert_eq!(privileges(&records[0]), vec!["EXECUTE"]);
}

#[test]
fn test_proxy_scope_is_principal_text() {
    let records = parse("GRANT PROXY ON ''@'' TO 'root'@'localhost' WITH GRANT OPTION");
    assert_eq!(records[0].identity.scope, "@");
    assert!(records[0].privileges.is_proxy());
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_grant_option_on_any_line_wins() {
    let records = parse(
        "GRANT SELECT ON `db`.* TO `u`@`%` WITH GRANT OPTION\nGRANT INSERT ON `db`.* TO `u`@`%`",
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].options, GrantOptions::WithGrant);
    assert_eq!(privileges(&records[0]), vec!["INSERT", "SELECT"]);
}

#[test]
fn test_same_user_different_hosts_are_distinct() {
    let records = parse("GRANT SELECT ON `db`.* TO `u`@`%`\nGRANT SELECT ON `db`.* TO `u`@`localhost`");
    let names: Vec<String> = records.iter().map(GrantRecord::name).collect();
    assert_eq!(names, vec!["u@%/db.*", "u@localhost/db.*"]);
}

// ============================================================================
// ALL Collapse Tests
// ============================================================================

#[test]
fn test_static_list_split_across_lines_collapses_after_merge() {
    let catalog = &STATIC_PRIVILEGE_CATALOGS[0];
    let (first, second) = catalog.privileges.split_at(10);
    let listing = format!(
        "GRANT {} ON *.* TO `root`@`localhost`\nGRANT {} ON *.* TO `root`@`localhost`",
        first.join(", "),
        second.join(", ")
    );

    let version: EngineVersion = "8.0.36-0ubuntu0.22.04.1".parse().unwrap();
    let grants = GrantParser::new(Some(&version)).parse(&listing);
    let identity = GrantIdentity::new(Principal::new("root", "localhost"), "*.*");
    assert_eq!(grants[&identity].privileges.to_vec(), vec!["ALL"]);
}

#[test]
fn test_static_list_not_collapsed_on_mariadb() {
    let catalog = &STATIC_PRIVILEGE_CATALOGS[0];
    let listing = format!("GRANT {} ON *.* TO `root`@`localhost`", catalog.privileges.join(", "));

    let version: EngineVersion = "10.6.12-MariaDB-log".parse().unwrap();
    let grants = GrantParser::new(Some(&version)).parse(&listing);
    let record = grants.values().next().unwrap();
    assert_eq!(record.privileges.len(), catalog.privileges.len());
}

#[test]
fn test_static_list_not_collapsed_on_mysql57() {
    let catalog = &STATIC_PRIVILEGE_CATALOGS[0];
    let listing = format!("GRANT {} ON *.* TO `root`@`localhost`", catalog.privileges.join(", "));

    let version: EngineVersion = "5.7.44".parse().unwrap();
    let grants = GrantParser::new(Some(&version)).parse(&listing);
    let record = grants.values().next().unwrap();
    assert!(!record.privileges.has_all());
}

#[test]
fn test_all_with_dynamic_privileges_collapses() {
    let records = parse(
        "GRANT ALL PRIVILEGES ON *.* TO `root`@`localhost` WITH GRANT OPTION\n\
         GRANT APPLICATION_PASSWORD_ADMIN,AUDIT_ADMIN,BACKUP_ADMIN ON *.* TO `root`@`localhost` WITH GRANT OPTION",
    );
    assert_eq!(records[0].privileges, ["ALL"].into_iter().collect::<PrivilegeSet>());
}
