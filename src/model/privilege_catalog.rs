//! Fixed privilege tables used to re-collapse expanded `ALL` grants.
//!
//! Some engine versions never print a literal `ALL PRIVILEGES` for a global
//! grant; they print every static privilege instead. These tables list what
//! that expansion looks like so the parser can recognize it. They are data,
//! not logic: add a new entry when an engine release changes the list.

use crate::engine::{EngineFlavor, EngineVersion};

/// Static privileges a given engine release expands `ALL` into.
#[derive(Debug)]
pub struct StaticPrivilegeCatalog {
    /// Lookup key, e.g. `mysql8`
    pub key: &'static str,
    pub flavor: EngineFlavor,
    /// First release (major, minor, patch) the list applies to
    pub since: (u32, u32, u32),
    pub privileges: &'static [&'static str],
}

impl StaticPrivilegeCatalog {
    /// Whether `version` is covered by this catalog.
    pub fn applies_to(&self, version: &EngineVersion) -> bool {
        version.flavor == self.flavor && version.triple() >= self.since
    }
}

const MYSQL8_STATIC_PRIVILEGES: &[&str] = &[
    "ALTER",
    "ALTER ROUTINE",
    "CREATE",
    "CREATE ROLE",
    "CREATE ROUTINE",
    "CREATE TABLESPACE",
    "CREATE TEMPORARY TABLES",
    "CREATE USER",
    "CREATE VIEW",
    "DELETE",
    "DROP",
    "DROP ROLE",
    "EVENT",
    "EXECUTE",
    "FILE",
    "INDEX",
    "INSERT",
    "LOCK TABLES",
    "PROCESS",
    "REFERENCES",
    "RELOAD",
    "REPLICATION CLIENT",
    "REPLICATION SLAVE",
    "SELECT",
    "SHOW DATABASES",
    "SHOW VIEW",
    "SHUTDOWN",
    "SUPER",
    "TRIGGER",
    "UPDATE",
];

/// All known static privilege catalogs.
pub static STATIC_PRIVILEGE_CATALOGS: &[StaticPrivilegeCatalog] = &[StaticPrivilegeCatalog {
    key: "mysql8",
    flavor: EngineFlavor::MySql,
    since: (8, 0, 0),
    privileges: MYSQL8_STATIC_PRIVILEGES,
}];

/// Dynamic (component-registered) privileges. These are printed on their own
/// `GRANT` line next to `ALL PRIVILEGES` and are ignored when deciding whether
/// a merged set means `ALL`.
pub static DYNAMIC_PRIVILEGES: &[&str] = &[
    "APPLICATION_PASSWORD_ADMIN",
    "AUDIT_ABORT_EXEMPT",
    "AUDIT_ADMIN",
    "AUTHENTICATION_POLICY_ADMIN",
    "BACKUP_ADMIN",
    "BINLOG_ADMIN",
    "BINLOG_ENCRYPTION_ADMIN",
    "CLONE_ADMIN",
    "CONNECTION_ADMIN",
    "ENCRYPTION_KEY_ADMIN",
    "FIREWALL_EXEMPT",
    "FLUSH_OPTIMIZER_COSTS",
    "FLUSH_STATUS",
    "FLUSH_TABLES",
    "FLUSH_USER_RESOURCES",
    "GROUP_REPLICATION_ADMIN",
    "GROUP_REPLICATION_STREAM",
    "INNODB_REDO_LOG_ARCHIVE",
    "INNODB_REDO_LOG_ENABLE",
    "PASSWORDLESS_USER_ADMIN",
    "PERSIST_RO_VARIABLES_ADMIN",
    "REPLICATION_APPLIER",
    "REPLICATION_SLAVE_ADMIN",
    "RESOURCE_GROUP_ADMIN",
    "RESOURCE_GROUP_USER",
    "ROLE_ADMIN",
    "SENSITIVE_VARIABLES_OBSERVER",
    "SERVICE_CONNECTION_ADMIN",
    "SESSION_VARIABLES_ADMIN",
    "SET_USER_ID",
    "SHOW_ROUTINE",
    "SYSTEM_USER",
    "SYSTEM_VARIABLES_ADMIN",
    "TABLE_ENCRYPTION_ADMIN",
    "TELEMETRY_LOG_ADMIN",
    "XA_RECOVER_ADMIN",
];

/// Newest static catalog covering `version`, if any.
pub fn static_catalog_for(version: &EngineVersion) -> Option<&'static StaticPrivilegeCatalog> {
    STATIC_PRIVILEGE_CATALOGS
        .iter()
        .filter(|catalog| catalog.applies_to(version))
        .max_by_key(|catalog| catalog.since)
}

pub fn is_dynamic_privilege(privilege: &str) -> bool {
    DYNAMIC_PRIVILEGES.contains(&privilege)
}
