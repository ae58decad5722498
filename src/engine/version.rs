//! Engine version detection

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::GrantSyncError;
use crate::util::contains_ci;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.(\d+)(?:\.(\d+))?").unwrap());

/// Server family; privilege listings differ between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineFlavor {
    MySql,
    MariaDb,
    Percona,
}

impl fmt::Display for EngineFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFlavor::MySql => f.write_str("MySQL"),
            EngineFlavor::MariaDb => f.write_str("MariaDB"),
            EngineFlavor::Percona => f.write_str("Percona"),
        }
    }
}

/// Version reported by `SELECT VERSION()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVersion {
    pub flavor: EngineFlavor,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub fn new(flavor: EngineFlavor, major: u32, minor: u32, patch: u32) -> Self {
        Self {
            flavor,
            major,
            minor,
            patch,
        }
    }

    pub fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }

    /// Longest user name the server accepts.
    pub fn max_user_length(&self) -> usize {
        if self.triple() < (5, 7, 8) {
            16
        } else if self.triple() < (10, 0, 0) {
            32
        } else {
            80
        }
    }
}

impl FromStr for EngineVersion {
    type Err = GrantSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flavor = if contains_ci(s, "mariadb") {
            EngineFlavor::MariaDb
        } else if contains_ci(s, "percona") {
            EngineFlavor::Percona
        } else {
            EngineFlavor::MySql
        };

        // Old MariaDB releases prefix the real version with "5.5.5-" for
        // replication compatibility
        let text = match (flavor, s.trim().strip_prefix("5.5.5-")) {
            (EngineFlavor::MariaDb, Some(rest)) => rest,
            _ => s,
        };

        let caps = VERSION_RE
            .captures(text)
            .ok_or_else(|| GrantSyncError::VersionParseError {
                version: s.to_string(),
            })?;
        let number = |i: usize| -> u32 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        Ok(EngineVersion::new(flavor, number(1), number(2), number(3)))
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{} ({})",
            self.major, self.minor, self.patch, self.flavor
        )
    }
}
