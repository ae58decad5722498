//! Desired-state manifest parsing

mod manifest_parser;

pub use manifest_parser::{
    check_user_lengths, parse_declared_principal, parse_manifest, parse_manifest_str,
    ConnectionSettings, GrantManifest,
};
