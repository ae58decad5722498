//! Error types for mysql-grant-sync

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while observing, planning, or applying grants
#[derive(Error, Debug)]
pub enum GrantSyncError {
    #[error("Failed to read manifest file: {path}")]
    ManifestReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest file: {path}")]
    ManifestParseError {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Invalid manifest format: {message}")]
    InvalidManifest { message: String },

    #[error("mysql_grant {name}: {message}")]
    InvalidGrant { name: String, message: String },

    #[error("Invalid database user {user}: {message}")]
    InvalidPrincipal { user: String, message: String },

    #[error("Failed to read grant listing: {path}")]
    ListingReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognized engine version: {version}")]
    VersionParseError { version: String },

    #[error("Engine version query failed: {message}")]
    EngineVersionFailed { message: String },

    #[error("Listing principals failed: {message}")]
    PrincipalListFailed { message: String },

    #[error("SHOW GRANTS for {principal} failed: {message}")]
    EngineQueryFailed { principal: String, message: String },

    #[error("Statement failed: {statement}: {message}")]
    StatementExecutionFailed { statement: String, message: String },
}
