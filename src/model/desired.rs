//! Desired state for one grant identity.

use std::fmt;

use super::{GrantIdentity, GrantOptions, PrivilegeSet};

/// Whether the grant should exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ensure::Present => f.write_str("present"),
            Ensure::Absent => f.write_str("absent"),
        }
    }
}

/// A declared grant, already validated and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredGrant {
    pub identity: GrantIdentity,
    pub ensure: Ensure,
    pub privileges: PrivilegeSet,
    /// `None` leaves the grant option unmanaged
    pub options: Option<GrantOptions>,
}

impl DesiredGrant {
    pub fn present(
        identity: GrantIdentity,
        privileges: PrivilegeSet,
        options: Option<GrantOptions>,
    ) -> Self {
        Self {
            identity,
            ensure: Ensure::Present,
            privileges,
            options,
        }
    }

    pub fn absent(identity: GrantIdentity) -> Self {
        Self {
            identity,
            ensure: Ensure::Absent,
            privileges: PrivilegeSet::new(),
            options: None,
        }
    }
}
