//! Turn raw `SHOW GRANTS` listings into normalized grant records.

use tracing::{debug, trace};

use super::grant_line::{tokenize_line, GrantLine, ParsedLine};
use super::privileges::normalize_privilege_list;
use crate::engine::{EngineFailure, EngineVersion};
use crate::error::GrantSyncError;
use crate::model::privilege_catalog::{is_dynamic_privilege, static_catalog_for, StaticPrivilegeCatalog};
use crate::model::{
    merge, GrantIdentity, GrantMap, GrantOptions, GrantRecord, Principal, PrivilegeSet, ALL,
};
use crate::util::contains_ci;

/// Engine message meaning the account exists but holds nothing on this host.
pub const NO_SUCH_GRANT: &str = "There is no such grant defined for user";

/// Whether an engine failure is the benign "no grants" condition.
pub fn is_no_grants_defined(failure: &EngineFailure) -> bool {
    contains_ci(&failure.message, NO_SUCH_GRANT)
}

/// Grant listing parser for one engine version.
#[derive(Debug, Clone, Default)]
pub struct GrantParser {
    catalog: Option<&'static StaticPrivilegeCatalog>,
}

impl GrantParser {
    /// Parser for the given engine version. With no version, only the
    /// version-independent dynamic-privilege collapse is applied.
    pub fn new(version: Option<&EngineVersion>) -> Self {
        Self {
            catalog: version.and_then(static_catalog_for),
        }
    }

    /// Parse a complete listing. Lines that do not look like grants are
    /// skipped; lines for the same identity are merged.
    pub fn parse(&self, listing: &str) -> GrantMap {
        let mut grants = GrantMap::new();

        for line in listing.lines() {
            match tokenize_line(line) {
                ParsedLine::Matched(fields) => {
                    let record = record_from_line(fields);
                    let existing = grants.remove(&record.identity);
                    let merged = merge(existing, record);
                    grants.insert(merged.identity.clone(), merged);
                }
                ParsedLine::Skipped => {
                    if !line.trim().is_empty() {
                        trace!(line, "skipping non-grant line");
                    }
                }
            }
        }

        for record in grants.values_mut() {
            let privileges = std::mem::take(&mut record.privileges);
            record.privileges = self.collapse_all(privileges);
        }

        grants
    }

    /// Parse the result of a `SHOW GRANTS` query for one principal.
    ///
    /// The "no such grant" failure yields an empty map; any other failure is
    /// returned as [`GrantSyncError::EngineQueryFailed`].
    pub fn parse_query_result(
        &self,
        principal: &Principal,
        result: Result<String, EngineFailure>,
    ) -> Result<GrantMap, GrantSyncError> {
        match result {
            Ok(listing) => Ok(self.parse(&listing)),
            Err(failure) if is_no_grants_defined(&failure) => {
                debug!(%principal, "no grants defined");
                Ok(GrantMap::new())
            }
            Err(failure) => Err(GrantSyncError::EngineQueryFailed {
                principal: principal.to_string(),
                message: failure.message,
            }),
        }
    }

    /// Replace an engine-expanded `ALL` with the sentinel.
    fn collapse_all(&self, privileges: PrivilegeSet) -> PrivilegeSet {
        if let Some(catalog) = self.catalog {
            if privileges.len() == catalog.privileges.len()
                && catalog.privileges.iter().all(|p| privileges.contains(p))
            {
                return [ALL].into_iter().collect();
            }
        }

        let only_all = {
            let mut remainder = privileges.iter().filter(|p| !is_dynamic_privilege(p));
            remainder.next() == Some(ALL) && remainder.next().is_none()
        };
        if only_all {
            return [ALL].into_iter().collect();
        }

        privileges
    }
}

fn record_from_line(fields: GrantLine) -> GrantRecord {
    let options = GrantOptions::from_flag(fields.with_grant_option());
    let privileges = normalize_privilege_list(&fields.privileges);
    let identity = GrantIdentity::new(Principal::new(fields.user, fields.host), fields.scope);
    GrantRecord::new(identity, privileges, options)
}
