//! mysql-grant-sync: declarative MySQL/MariaDB grant reconciliation
//!
//! This library reads the grants a server reports through `SHOW GRANTS`,
//! normalizes them, and plans the GRANT/REVOKE statements that bring them in
//! line with a declared manifest.

pub mod diff;
pub mod engine;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod model;
pub mod parser;
pub mod reconcile;
pub mod util;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

pub use error::GrantSyncError;

use engine::{EngineVersion, MysqlCliConfig};
use manifest::{check_user_lengths, ConnectionSettings, GrantManifest};
use model::GrantMap;
use parser::GrantParser;
use reconcile::IdentityPlan;

/// Client settings given on the command line. These win over the manifest's
/// `<Connection>` element.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Path to the mysql client binary
    pub program: Option<PathBuf>,
    /// Directory holding the client credential files
    pub home: Option<PathBuf>,
}

/// Resolve the client configuration from command line overrides, then the
/// manifest, then defaults.
pub fn client_config(
    overrides: &ClientOptions,
    connection: Option<&ConnectionSettings>,
) -> MysqlCliConfig {
    let mut config = MysqlCliConfig::default();

    if let Some(connection) = connection {
        if let Some(client) = &connection.client {
            config.program = client.clone();
        }
        if let Some(home) = &connection.home {
            config.home = Some(home.clone());
        }
        if let Some(database) = &connection.system_database {
            config.system_database = database.clone();
        }
    }

    if let Some(program) = &overrides.program {
        config.program = program.clone();
    }
    if let Some(home) = &overrides.home {
        config.home = Some(home.clone());
    }

    config
}

/// Parse an optional version string.
pub fn parse_version(version: Option<&str>) -> Result<Option<EngineVersion>> {
    Ok(version.map(str::parse::<EngineVersion>).transpose()?)
}

/// Parse a saved `SHOW GRANTS` listing.
pub fn parse_listing_file(path: &Path, version: Option<&EngineVersion>) -> Result<GrantMap> {
    let listing = util::read_text_with_encoding_fallback(path).map_err(|e| {
        GrantSyncError::ListingReadError {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    let grants = GrantParser::new(version).parse(&listing);
    info!(path = %path.display(), count = grants.len(), "parsed grant listing");
    Ok(grants)
}

/// Plan a manifest against a saved listing instead of a live server.
///
/// Identities missing from the listing are treated as holding nothing.
pub fn plan_from_listing(
    manifest: &GrantManifest,
    listing_path: &Path,
    version_override: Option<&str>,
) -> Result<Vec<IdentityPlan>> {
    let version = parse_version(version_override.or(manifest.engine_version.as_deref()))?;
    match &version {
        Some(version) => check_user_lengths(&manifest.grants, version)?,
        None => warn!("no engine version given; only the dynamic privilege ALL collapse applies"),
    }

    let observed = parse_listing_file(listing_path, version.as_ref())?;
    Ok(reconcile::plan(&manifest.grants, &observed))
}
