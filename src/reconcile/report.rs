//! Human-readable grant, plan, and apply report printers

use std::fmt::Write;

use super::{IdentityPlan, Outcome, ReconcileReport};
use crate::model::GrantMap;

/// One line per observed identity: `user@host/scope: PRIVS (options)`.
pub fn render_grants(grants: &GrantMap) -> String {
    let mut out = String::new();
    if grants.is_empty() {
        out.push_str("(no grants)\n");
        return out;
    }
    for record in grants.values() {
        let _ = writeln!(
            out,
            "{}: {} ({})",
            record.identity, record.privileges, record.options
        );
    }
    out
}

/// Planned statements per identity, with a summary line.
pub fn render_plan(plans: &[IdentityPlan]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Grant Plan ===");
    let _ = writeln!(out);

    let mut changes = 0;
    for plan in plans {
        let _ = writeln!(out, "--- {} ---", plan.identity);
        if plan.is_noop() {
            let _ = writeln!(out, "OK (in sync)");
        } else {
            changes += 1;
            for statement in &plan.statements {
                let _ = writeln!(out, "  {}", statement.sql);
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Summary: {} to change, {} in sync",
        changes,
        plans.len() - changes
    );
    out
}

/// Apply outcome per identity. Failed identities list the statements that
/// already ran so partial application is visible.
pub fn render_report(report: &ReconcileReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Grant Apply Report ===");
    let _ = writeln!(out);

    for entry in &report.outcomes {
        let _ = writeln!(out, "--- {} ---", entry.identity);
        match &entry.outcome {
            Outcome::Unchanged => {
                let _ = writeln!(out, "OK (unchanged)");
            }
            Outcome::Applied { statements } => {
                let _ = writeln!(out, "Applied {} statement(s)", statements.len());
                for sql in statements {
                    let _ = writeln!(out, "  {}", sql);
                }
            }
            Outcome::Failed { error, applied } => {
                let _ = writeln!(out, "FAILED: {}", error);
                if applied.is_empty() {
                    let _ = writeln!(out, "  (nothing applied)");
                } else {
                    let _ = writeln!(out, "  Applied before failure:");
                    for sql in applied {
                        let _ = writeln!(out, "    {}", sql);
                    }
                }
            }
        }
        let _ = writeln!(out);
    }

    let failed = report.failed().count();
    let _ = writeln!(
        out,
        "Summary: {} changed, {} unchanged, {} failed",
        report.changed_count(),
        report.outcomes.len() - report.changed_count() - failed,
        failed
    );
    out
}

pub fn print_grants(grants: &GrantMap) {
    print!("{}", render_grants(grants));
}

pub fn print_plan(plans: &[IdentityPlan]) {
    print!("{}", render_plan(plans));
}

pub fn print_report(report: &ReconcileReport) {
    print!("{}", render_report(report));
}
