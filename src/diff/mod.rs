//! Compute the GRANT/REVOKE steps that move observed state to desired state.

mod statements;

pub use statements::{
    format_privileges, format_scope, grant_statement, render_actions, revoke_statements,
    Statement, FLUSH_PRIVILEGES,
};

use crate::model::{DesiredGrant, Ensure, GrantOptions, GrantRecord, PrivilegeSet, ALL};

/// Privileges to take away and privileges to hand out for one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub revoke: PrivilegeSet,
    pub grant: PrivilegeSet,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.revoke.is_empty() && self.grant.is_empty()
    }
}

/// Two-way privilege diff.
///
/// Holding `ALL` can only be narrowed by revoking everything and granting the
/// desired set again. Moving to `ALL` is a plain grant. Otherwise the result
/// is the element-wise difference in each direction.
pub fn diff_privileges(previous: &PrivilegeSet, desired: &PrivilegeSet) -> DiffResult {
    if previous.has_all() {
        DiffResult {
            revoke: previous.clone(),
            grant: desired.clone(),
        }
    } else if desired.has_all() {
        DiffResult {
            revoke: PrivilegeSet::new(),
            grant: desired.clone(),
        }
    } else {
        DiffResult {
            revoke: previous.difference(desired),
            grant: desired.difference(previous),
        }
    }
}

/// One step of a plan, before rendering to SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantAction {
    Grant {
        privileges: PrivilegeSet,
        options: GrantOptions,
    },
    Revoke {
        privileges: PrivilegeSet,
    },
    FlushPrivileges,
}

/// Revoke that removes every privilege `current` holds, grant option
/// included. PROXY grants have to be revoked by name; everything else goes
/// with ALL.
fn revoke_everything(current: &GrantRecord) -> GrantAction {
    let privileges = if current.privileges.is_proxy() {
        current.privileges.clone()
    } else {
        [ALL].into_iter().collect()
    };
    GrantAction::Revoke { privileges }
}

/// Steps needed to bring `observed` (absent when the engine reported nothing
/// for the identity) in line with `desired`.
pub fn plan_changes(observed: Option<&GrantRecord>, desired: &DesiredGrant) -> Vec<GrantAction> {
    let mut actions = Vec::new();

    match (desired.ensure, observed) {
        (Ensure::Absent, None) => {}
        (Ensure::Absent, Some(current)) => {
            actions.push(revoke_everything(current));
        }
        (Ensure::Present, None) => {
            actions.push(GrantAction::Grant {
                privileges: desired.privileges.clone(),
                options: desired.options.unwrap_or_default(),
            });
        }
        (Ensure::Present, Some(current)) => match desired.options {
            // The option flag cannot be toggled on its own and a plain
            // REVOKE leaves it in place: drop everything and grant the
            // declared set again with the new flag
            Some(options) if options != current.options => {
                actions.push(revoke_everything(current));
                actions.push(GrantAction::Grant {
                    privileges: desired.privileges.clone(),
                    options,
                });
            }
            options => {
                if current.privileges != desired.privileges {
                    let diff = diff_privileges(&current.privileges, &desired.privileges);
                    if !diff.revoke.is_empty() {
                        actions.push(GrantAction::Revoke {
                            privileges: diff.revoke,
                        });
                    }
                    if !diff.grant.is_empty() {
                        actions.push(GrantAction::Grant {
                            privileges: diff.grant,
                            options: options.unwrap_or(current.options),
                        });
                    }
                }
            }
        },
    }

    if !actions.is_empty() {
        actions.push(GrantAction::FlushPrivileges);
    }
    actions
}
