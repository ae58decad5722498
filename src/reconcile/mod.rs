//! Observe, plan, and apply grant changes against an engine
//!
//! Each identity is reconciled on its own: a failure while observing one
//! principal or applying one identity's statements is recorded in the report
//! and the remaining identities carry on.

pub mod report;

use std::collections::BTreeMap;

use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::diff::{plan_changes, render_actions, GrantAction, Statement};
use crate::engine::{Engine, EngineVersion};
use crate::error::GrantSyncError;
use crate::manifest::{check_user_lengths, GrantManifest};
use crate::model::{DesiredGrant, GrantIdentity, GrantMap, Principal};
use crate::parser::GrantParser;

/// Minimum number of principals to benefit from parallel observation.
/// Below this threshold, sequential queries are faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// Grants observed for a set of principals.
#[derive(Debug, Default)]
pub struct Observation {
    pub grants: GrantMap,
    /// Principals whose grant listing could not be read, with the engine message
    pub failures: BTreeMap<Principal, String>,
}

/// Planned changes for one identity.
#[derive(Debug, Clone)]
pub struct IdentityPlan {
    pub identity: GrantIdentity,
    pub actions: Vec<GrantAction>,
    pub statements: Vec<Statement>,
}

impl IdentityPlan {
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// What happened to one identity.
#[derive(Debug)]
pub enum Outcome {
    Unchanged,
    Applied { statements: Vec<String> },
    /// `applied` lists the statements that ran before the failure
    Failed {
        error: GrantSyncError,
        applied: Vec<String>,
    },
}

#[derive(Debug)]
pub struct IdentityOutcome {
    pub identity: GrantIdentity,
    pub outcome: Outcome,
}

/// Result of a reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub outcomes: Vec<IdentityOutcome>,
}

impl ReconcileReport {
    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn failed(&self) -> impl Iterator<Item = &IdentityOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed { .. }))
    }

    pub fn changed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Applied { .. }))
            .count()
    }
}

/// Engine version to use for parsing: an explicit override wins, otherwise
/// the engine is asked.
pub fn resolve_version<E: Engine>(
    engine: &E,
    version_override: Option<&str>,
) -> Result<EngineVersion, GrantSyncError> {
    let text = match version_override {
        Some(text) => text.to_string(),
        None => engine
            .version()
            .map_err(|failure| GrantSyncError::EngineVersionFailed {
                message: failure.message,
            })?,
    };
    text.parse()
}

/// Query and parse the grants of every principal. Without a version only the
/// version-independent `ALL` collapse is applied.
pub fn observe<E: Engine>(
    engine: &E,
    principals: &[Principal],
    version: Option<&EngineVersion>,
) -> Observation {
    let parser = GrantParser::new(version);
    let query = |principal: &Principal| {
        let result = parser.parse_query_result(principal, engine.show_grants(principal));
        (principal.clone(), result)
    };

    let results: Vec<(Principal, Result<GrantMap, GrantSyncError>)> =
        if principals.len() >= PARALLEL_THRESHOLD {
            principals.par_iter().map(query).collect()
        } else {
            principals.iter().map(query).collect()
        };

    let mut observation = Observation::default();
    for (principal, result) in results {
        match result {
            Ok(grants) => {
                debug!(%principal, count = grants.len(), "observed grants");
                observation.grants.extend(grants);
            }
            Err(GrantSyncError::EngineQueryFailed { message, .. }) => {
                warn!(%principal, %message, "could not read grants");
                observation.failures.insert(principal, message);
            }
            Err(other) => {
                warn!(%principal, error = %other, "could not read grants");
                observation.failures.insert(principal, other.to_string());
            }
        }
    }
    observation
}

/// Plan every declared grant against what was observed.
pub fn plan(desired: &[DesiredGrant], observed: &GrantMap) -> Vec<IdentityPlan> {
    desired
        .iter()
        .map(|grant| {
            let actions = plan_changes(observed.get(&grant.identity), grant);
            let statements = render_actions(&grant.identity, &actions);
            IdentityPlan {
                identity: grant.identity.clone(),
                actions,
                statements,
            }
        })
        .collect()
}

/// Execute plans in order. Statements for one identity stop at the first
/// failure; other identities are still attempted. Identities whose principal
/// could not be observed are failed without running anything.
pub fn apply<E: Engine>(
    engine: &E,
    plans: &[IdentityPlan],
    observation_failures: &BTreeMap<Principal, String>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for plan in plans {
        let outcome = if let Some(failed) = unobserved(plan, observation_failures) {
            failed
        } else if plan.is_noop() {
            Outcome::Unchanged
        } else {
            apply_identity(engine, plan)
        };

        report.outcomes.push(IdentityOutcome {
            identity: plan.identity.clone(),
            outcome,
        });
    }

    report
}

fn unobserved(plan: &IdentityPlan, failures: &BTreeMap<Principal, String>) -> Option<Outcome> {
    let message = failures.get(&plan.identity.principal)?;
    Some(Outcome::Failed {
        error: GrantSyncError::EngineQueryFailed {
            principal: plan.identity.principal.to_string(),
            message: message.clone(),
        },
        applied: Vec::new(),
    })
}

fn apply_identity<E: Engine>(engine: &E, plan: &IdentityPlan) -> Outcome {
    let mut applied = Vec::with_capacity(plan.statements.len());

    for statement in &plan.statements {
        match engine.execute(&statement.sql, statement.mode) {
            Ok(_) => {
                info!(identity = %plan.identity, sql = %statement.sql, "applied");
                applied.push(statement.sql.clone());
            }
            Err(failure) => {
                warn!(identity = %plan.identity, sql = %statement.sql, error = %failure, "statement failed");
                return Outcome::Failed {
                    error: GrantSyncError::StatementExecutionFailed {
                        statement: statement.sql.clone(),
                        message: failure.message,
                    },
                    applied,
                };
            }
        }
    }

    Outcome::Applied {
        statements: applied,
    }
}

/// Observe the manifest's principals, plan, and optionally apply.
///
/// With `dry_run` nothing is executed and the report only lists identities
/// whose principal could not be observed.
pub fn reconcile<E: Engine>(
    engine: &E,
    manifest: &GrantManifest,
    version_override: Option<&str>,
    dry_run: bool,
) -> Result<(Vec<IdentityPlan>, ReconcileReport)> {
    let version_text = version_override.or(manifest.engine_version.as_deref());
    let version = resolve_version(engine, version_text)?;
    info!(%version, grants = manifest.grants.len(), "reconciling");

    check_user_lengths(&manifest.grants, &version)?;

    let observation = observe(engine, &manifest.principals(), Some(&version));
    let plans = plan(&manifest.grants, &observation.grants);

    let report = if dry_run {
        ReconcileReport {
            outcomes: plans
                .iter()
                .filter_map(|plan| {
                    unobserved(plan, &observation.failures).map(|outcome| IdentityOutcome {
                        identity: plan.identity.clone(),
                        outcome,
                    })
                })
                .collect(),
        }
    } else {
        apply(engine, &plans, &observation.failures)
    };

    Ok((plans, report))
}
