//! Parser for grant manifest files

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use roxmltree::{Document, Node};

use crate::engine::EngineVersion;
use crate::error::GrantSyncError;
use crate::model::{DesiredGrant, Ensure, GrantIdentity, GrantOptions, Principal, PrivilegeSet};
use crate::parser::{normalize_privilege, split_privilege_list};

static HOST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w%.:\-/]+$").unwrap());

/// Client settings from `<Connection>`
#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    /// Path to the mysql client binary
    pub client: Option<PathBuf>,
    /// Directory holding `.my.cnf` / `.mylogin.cnf`
    pub home: Option<PathBuf>,
    /// Database used for administrative statements
    pub system_database: Option<String>,
}

/// Parsed grant manifest
#[derive(Debug, Clone)]
pub struct GrantManifest {
    /// Manifest file the grants came from
    pub path: PathBuf,
    pub connection: ConnectionSettings,
    /// Version override from `<Engine version="..."/>`
    pub engine_version: Option<String>,
    /// Declared grants, in document order
    pub grants: Vec<DesiredGrant>,
}

impl GrantManifest {
    /// Every principal named by a declared grant, deduplicated, in order.
    pub fn principals(&self) -> Vec<Principal> {
        let mut seen = HashSet::new();
        self.grants
            .iter()
            .map(|grant| grant.identity.principal.clone())
            .filter(|principal| seen.insert(principal.clone()))
            .collect()
    }
}

/// Parse a grant manifest file
pub fn parse_manifest(path: &Path) -> Result<GrantManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| GrantSyncError::ManifestReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_manifest_str(&content, path)
}

/// Parse manifest XML already in memory; `path` is used for error messages.
pub fn parse_manifest_str(content: &str, path: &Path) -> Result<GrantManifest> {
    let doc = Document::parse(content).map_err(|e| GrantSyncError::ManifestParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "GrantManifest" {
        return Err(GrantSyncError::InvalidManifest {
            message: format!(
                "expected <GrantManifest> root element, found <{}>",
                root.tag_name().name()
            ),
        }
        .into());
    }

    let connection = parse_connection(&root);

    let engine_version = root
        .children()
        .find(|n| n.tag_name().name() == "Engine")
        .and_then(|n| n.attribute("version"))
        .map(|s| s.trim().to_string());

    let mut grants = Vec::new();
    let mut seen = HashSet::new();
    for node in root.children().filter(|n| n.tag_name().name() == "Grant") {
        let grant = parse_grant(&node)?;
        if !seen.insert(grant.identity.clone()) {
            return Err(GrantSyncError::InvalidGrant {
                name: grant.identity.to_string(),
                message: "declared more than once".to_string(),
            }
            .into());
        }
        grants.push(grant);
    }

    Ok(GrantManifest {
        path: path.to_path_buf(),
        connection,
        engine_version,
        grants,
    })
}

fn parse_connection(root: &Node) -> ConnectionSettings {
    let Some(node) = root.children().find(|n| n.tag_name().name() == "Connection") else {
        return ConnectionSettings::default();
    };

    ConnectionSettings {
        client: node.attribute("client").map(PathBuf::from),
        home: node.attribute("home").map(PathBuf::from),
        system_database: node.attribute("systemDatabase").map(|s| s.to_string()),
    }
}

/// Read an attribute, falling back to a child element of the same name
/// with the first letter upper-cased (`user` / `<User>`).
fn attribute_or_child(node: &Node, name: &str) -> Option<String> {
    if let Some(value) = node.attribute(name) {
        return Some(value.trim().to_string());
    }
    let mut chars = name.chars();
    let element = match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => return None,
    };
    node.children()
        .find(|n| n.tag_name().name() == element)
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
}

fn parse_grant(node: &Node) -> Result<DesiredGrant, GrantSyncError> {
    let user = attribute_or_child(node, "user");
    let table = attribute_or_child(node, "table").map(|t| t.replace('`', ""));
    let declared_name = node.attribute("name").map(|s| s.trim().to_string());

    let display_name = declared_name.clone().unwrap_or_else(|| {
        format!(
            "{}/{}",
            user.as_deref().unwrap_or("?"),
            table.as_deref().unwrap_or("?")
        )
    });
    let invalid = |message: &str| GrantSyncError::InvalidGrant {
        name: display_name.clone(),
        message: message.to_string(),
    };

    let ensure = match node.attribute("ensure").map(|s| s.trim().to_lowercase()) {
        None => Ensure::Present,
        Some(ref s) if s == "present" => Ensure::Present,
        Some(ref s) if s == "absent" => Ensure::Absent,
        Some(_) => return Err(invalid("`ensure` must be present or absent")),
    };

    let user = user.ok_or_else(|| invalid("`user` parameter is required"))?;
    let table = table.ok_or_else(|| invalid("`table` parameter is required"))?;

    let principal = parse_declared_principal(&user)?;
    let identity = GrantIdentity::new(principal, table.clone());

    if let Some(name) = &declared_name {
        let matches = name
            .strip_suffix(&format!("/{}", table))
            .and_then(|declared| parse_declared_principal(declared).ok())
            .is_some_and(|declared| declared == identity.principal);
        if !matches {
            return Err(invalid("`name` parameter must match user@host/table format"));
        }
    }

    let privileges = collect_privileges(node);
    if ensure == Ensure::Present && privileges.is_empty() {
        return Err(invalid("`privileges` parameter is required"));
    }
    if privileges.len() > 1 && privileges.is_proxy() {
        return Err(invalid("`privileges` parameter: PROXY can only be specified by itself"));
    }
    if privileges.is_proxy() && Principal::split(&table).is_none() {
        return Err(invalid("`table` of a PROXY grant must be a user@host"));
    }

    let options = match attribute_or_child(node, "options") {
        None => None,
        Some(value) if value.is_empty() => None,
        Some(value) => Some(
            value
                .parse::<GrantOptions>()
                .map_err(|_| invalid("`options` must be GRANT or NONE"))?,
        ),
    };

    Ok(DesiredGrant {
        identity,
        ensure,
        privileges,
        options,
    })
}

/// Privileges from a `privileges="A, B"` attribute and `<Privilege>`
/// children, normalized the same way engine output is.
fn collect_privileges(node: &Node) -> PrivilegeSet {
    let mut privileges = PrivilegeSet::new();

    if let Some(list) = node.attribute("privileges") {
        for token in split_privilege_list(list) {
            privileges.insert(normalize_privilege(token));
        }
    }

    for child in node.children().filter(|n| n.tag_name().name() == "Privilege") {
        if let Some(text) = child.text() {
            let text = text.trim();
            if !text.is_empty() {
                privileges.insert(normalize_privilege(text));
            }
        }
    }

    privileges
}

/// Validate and normalize a declared `user@host`.
///
/// The user part may be wrapped in matching quotes; the host is
/// lower-cased and limited to host-name, address, and wildcard characters.
pub fn parse_declared_principal(value: &str) -> Result<Principal, GrantSyncError> {
    let invalid = |message: &str| GrantSyncError::InvalidPrincipal {
        user: value.to_string(),
        message: message.to_string(),
    };

    let Principal { user, host } =
        Principal::split(value.trim()).ok_or_else(|| invalid("expected user@host"))?;

    let user = match user.chars().next() {
        Some(quote @ ('\'' | '`' | '"')) => {
            if user.len() < 2 || !user.ends_with(quote) {
                return Err(invalid("unbalanced quotes around user name"));
            }
            user[1..user.len() - 1].to_string()
        }
        _ => user,
    };

    let host = host.trim_matches(|c| matches!(c, '\'' | '`' | '"'));
    if !HOST_RE.is_match(host) {
        return Err(invalid("invalid host"));
    }

    Ok(Principal::new(user, host.to_lowercase()))
}

/// Reject user names longer than the engine allows.
pub fn check_user_lengths(grants: &[DesiredGrant], version: &EngineVersion) -> Result<(), GrantSyncError> {
    let limit = version.max_user_length();
    for grant in grants {
        let user = &grant.identity.principal.user;
        if user.chars().count() > limit {
            return Err(GrantSyncError::InvalidPrincipal {
                user: user.clone(),
                message: format!(
                    "user names are limited to a maximum of {} characters on {}",
                    limit, version
                ),
            });
        }
    }
    Ok(())
}
