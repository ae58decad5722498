//! Normalized grant model
//!
//! Records are rebuilt from live engine output (or from the manifest) on
//! every reconciliation pass and discarded afterwards. The only identity that
//! survives across passes is the textual [`GrantIdentity`] key.

mod desired;
pub mod privilege_catalog;

pub use desired::{DesiredGrant, Ensure};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Privilege token meaning "every privilege applicable to the scope".
pub const ALL: &str = "ALL";

/// Privilege token for PROXY grants, whose scope is itself a principal.
pub const PROXY: &str = "PROXY";

/// A user/host pair that grants apply to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal {
    pub user: String,
    pub host: String,
}

impl Principal {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    /// Split a `user@host` string at the last `@`.
    ///
    /// Returns `None` when there is no `@` at all.
    pub fn split(s: &str) -> Option<Self> {
        let (user, host) = s.rsplit_once('@')?;
        Some(Self::new(user, host))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

/// Key of a grant: who it applies to and what it applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GrantIdentity {
    pub principal: Principal,
    /// `db.table`, `*.*`, `PROCEDURE db.proc`, or `user@host` for PROXY grants
    pub scope: String,
}

impl GrantIdentity {
    pub fn new(principal: Principal, scope: impl Into<String>) -> Self {
        Self {
            principal,
            scope: scope.into(),
        }
    }
}

impl fmt::Display for GrantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.principal, self.scope)
    }
}

/// Sorted, deduplicated set of normalized privilege tokens.
///
/// Tokens are expected to be normalized already (see
/// [`crate::parser::normalize_privilege`]); the set itself only orders them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PrivilegeSet(BTreeSet<String>);

impl PrivilegeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, privilege: impl Into<String>) -> bool {
        self.0.insert(privilege.into())
    }

    pub fn contains(&self, privilege: &str) -> bool {
        self.0.contains(privilege)
    }

    /// Whether the set holds the `ALL` sentinel.
    pub fn has_all(&self) -> bool {
        self.contains(ALL)
    }

    pub fn is_proxy(&self) -> bool {
        self.contains(PROXY)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Tokens in `self` that are not in `other`.
    pub fn difference(&self, other: &PrivilegeSet) -> PrivilegeSet {
        PrivilegeSet(self.0.difference(&other.0).cloned().collect())
    }

    pub fn union(&self, other: &PrivilegeSet) -> PrivilegeSet {
        PrivilegeSet(self.0.union(&other.0).cloned().collect())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PrivilegeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        PrivilegeSet(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for PrivilegeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.iter().collect();
        f.write_str(&tokens.join(", "))
    }
}

/// Whether the grantee may pass its privileges on (`WITH GRANT OPTION`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GrantOptions {
    /// Rendered `GRANT`
    WithGrant,
    /// Rendered `NONE`
    #[default]
    NoGrant,
}

impl GrantOptions {
    pub fn from_flag(with_grant_option: bool) -> Self {
        if with_grant_option {
            GrantOptions::WithGrant
        } else {
            GrantOptions::NoGrant
        }
    }

    pub fn with_grant_option(self) -> bool {
        self == GrantOptions::WithGrant
    }

    /// Union of two option sets; the grant option wins.
    pub fn merge(self, other: GrantOptions) -> GrantOptions {
        GrantOptions::from_flag(self.with_grant_option() || other.with_grant_option())
    }
}

impl fmt::Display for GrantOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantOptions::WithGrant => f.write_str("GRANT"),
            GrantOptions::NoGrant => f.write_str("NONE"),
        }
    }
}

impl FromStr for GrantOptions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GRANT" => Ok(GrantOptions::WithGrant),
            "NONE" => Ok(GrantOptions::NoGrant),
            other => Err(format!("Unknown grant option: {}", other)),
        }
    }
}

/// One normalized grant: identity, privileges, and options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecord {
    pub identity: GrantIdentity,
    pub privileges: PrivilegeSet,
    pub options: GrantOptions,
}

impl GrantRecord {
    pub fn new(identity: GrantIdentity, privileges: PrivilegeSet, options: GrantOptions) -> Self {
        Self {
            identity,
            privileges,
            options,
        }
    }

    /// Name of the grant in `user@host/scope` form.
    pub fn name(&self) -> String {
        self.identity.to_string()
    }
}

/// Observed grants keyed by identity, in deterministic order.
pub type GrantMap = BTreeMap<GrantIdentity, GrantRecord>;

/// Merge a newly parsed record into the record already held for the same
/// identity, if any. Privileges are unioned, options OR'd.
pub fn merge(existing: Option<GrantRecord>, incoming: GrantRecord) -> GrantRecord {
    match existing {
        None => incoming,
        Some(existing) => GrantRecord {
            privileges: existing.privileges.union(&incoming.privileges),
            options: existing.options.merge(incoming.options),
            identity: existing.identity,
        },
    }
}
