//! The database engine as seen by the reconciler
//!
//! Everything that touches a live server goes through the [`Engine`] trait so
//! the parser, planner, and reconciler stay pure and testable.

mod mysql_cli;
mod version;

use std::fmt;

pub use mysql_cli::{MysqlCli, MysqlCliConfig};
pub use version::{EngineFlavor, EngineVersion};

use crate::model::Principal;

/// Query listing every account on the server.
pub const LIST_PRINCIPALS_SQL: &str = "SELECT CONCAT(User, '@', Host) AS User FROM mysql.user";

pub const VERSION_SQL: &str = "SELECT VERSION()";

/// Privilege level a statement is executed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Administrative statements (GRANT, REVOKE) against the system database
    System,
    /// Plain queries in batch mode (SHOW GRANTS, FLUSH PRIVILEGES)
    Regular,
}

/// A failure reported by the engine, carrying its message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    pub message: String,
}

impl EngineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineFailure {}

/// Operations the reconciler needs from a database server.
pub trait Engine: Sync {
    /// Raw output of `SHOW GRANTS FOR <principal>`.
    fn show_grants(&self, principal: &Principal) -> Result<String, EngineFailure>;

    /// Execute a GRANT/REVOKE/FLUSH statement and return its output.
    fn execute(&self, sql: &str, mode: ExecMode) -> Result<String, EngineFailure>;

    /// Server version text, as returned by `SELECT VERSION()`.
    fn version(&self) -> Result<String, EngineFailure>;

    /// Every account defined on the server.
    fn list_principals(&self) -> Result<Vec<Principal>, EngineFailure>;
}

/// Render the principal the way `SHOW GRANTS FOR` expects it: `'user'@'host'`.
pub fn quote_principal(principal: &Principal) -> String {
    use sqlparser::ast::Ident;

    format!(
        "{}@{}",
        Ident::with_quote('\'', principal.user.as_str()),
        Ident::with_quote('\'', principal.host.as_str())
    )
}

/// Parse the one-account-per-line output of [`LIST_PRINCIPALS_SQL`].
pub fn parse_principal_list(output: &str) -> Vec<Principal> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(Principal::split)
        .collect()
}
