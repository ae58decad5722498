//! Engine implementation driving the `mysql` command line client

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::{
    parse_principal_list, quote_principal, Engine, EngineFailure, ExecMode,
    LIST_PRINCIPALS_SQL, VERSION_SQL,
};
use crate::model::Principal;

/// How to invoke the client.
#[derive(Debug, Clone)]
pub struct MysqlCliConfig {
    /// Client binary (default `mysql`)
    pub program: PathBuf,
    /// Directory searched for `.mylogin.cnf` / `.my.cnf`
    pub home: Option<PathBuf>,
    /// Database selected for System mode statements
    pub system_database: String,
}

impl Default for MysqlCliConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("mysql"),
            home: std::env::var_os("HOME").map(PathBuf::from),
            system_database: "mysql".to_string(),
        }
    }
}

/// Credential source picked up from the home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Credentials {
    /// `.mylogin.cnf`, passed through MYSQL_TEST_LOGIN_FILE
    LoginPath(PathBuf),
    /// `.my.cnf`, passed as --defaults-extra-file
    DefaultsFile(PathBuf),
    None,
}

fn find_credentials(home: Option<&Path>) -> Credentials {
    let Some(home) = home else {
        return Credentials::None;
    };
    let login = home.join(".mylogin.cnf");
    if login.is_file() {
        return Credentials::LoginPath(login);
    }
    let defaults = home.join(".my.cnf");
    if defaults.is_file() {
        return Credentials::DefaultsFile(defaults);
    }
    Credentials::None
}

/// Client arguments for one statement. The defaults file, when used, must
/// come first on the command line.
fn build_args(
    sql: &str,
    mode: ExecMode,
    credentials: &Credentials,
    system_database: &str,
) -> Vec<String> {
    let mut args = Vec::with_capacity(4);
    if let Credentials::DefaultsFile(path) = credentials {
        args.push(format!("--defaults-extra-file={}", path.display()));
    }
    match mode {
        ExecMode::System => {
            args.push(format!("--database={}", system_database));
            args.push("-e".to_string());
        }
        ExecMode::Regular => args.push("-NBe".to_string()),
    }
    args.push(sql.to_string());
    args
}

/// [`Engine`] backed by the `mysql` client binary.
#[derive(Debug, Clone, Default)]
pub struct MysqlCli {
    config: MysqlCliConfig,
}

impl MysqlCli {
    pub fn new(config: MysqlCliConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MysqlCliConfig {
        &self.config
    }

    fn run(&self, sql: &str, mode: ExecMode) -> Result<String, EngineFailure> {
        let credentials = find_credentials(self.config.home.as_deref());
        let args = build_args(sql, mode, &credentials, &self.config.system_database);

        let mut command = Command::new(&self.config.program);
        command.args(&args);
        if let Credentials::LoginPath(path) = &credentials {
            command.env("MYSQL_TEST_LOGIN_FILE", path);
        }

        debug!(program = %self.config.program.display(), ?mode, sql, "running mysql client");

        let output = command.output().map_err(|e| {
            EngineFailure::new(format!(
                "failed to run {}: {}",
                self.config.program.display(),
                e
            ))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        Err(EngineFailure::new(format!(
            "{} (exit status: {})",
            message, output.status
        )))
    }
}

impl Engine for MysqlCli {
    fn show_grants(&self, principal: &Principal) -> Result<String, EngineFailure> {
        let sql = format!("SHOW GRANTS FOR {};", quote_principal(principal));
        self.run(&sql, ExecMode::Regular)
    }

    fn execute(&self, sql: &str, mode: ExecMode) -> Result<String, EngineFailure> {
        self.run(sql, mode)
    }

    fn version(&self) -> Result<String, EngineFailure> {
        self.run(VERSION_SQL, ExecMode::Regular)
            .map(|output| output.trim().to_string())
    }

    fn list_principals(&self) -> Result<Vec<Principal>, EngineFailure> {
        let output = self.run(LIST_PRINCIPALS_SQL, ExecMode::Regular)?;
        Ok(parse_principal_list(&output))
    }
}
