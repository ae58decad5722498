//! SQL text for planned grant actions.

use sqlparser::ast::Ident;

use super::GrantAction;
use crate::engine::{quote_principal, ExecMode};
use crate::model::{GrantIdentity, GrantOptions, Principal, PrivilegeSet};
use crate::util::starts_with_ci;

pub const FLUSH_PRIVILEGES: &str = "FLUSH PRIVILEGES";

/// A rendered statement and the mode it must run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub mode: ExecMode,
}

impl Statement {
    fn system(sql: String) -> Self {
        Self {
            sql,
            mode: ExecMode::System,
        }
    }
}

/// `ALL PRIVILEGES` when the set holds `ALL`, else the comma-joined tokens.
pub fn format_privileges(privileges: &PrivilegeSet) -> String {
    if privileges.has_all() {
        "ALL PRIVILEGES".to_string()
    } else {
        privileges.to_string()
    }
}

/// Quote the database part of a scope: `` `db`.table ``.
///
/// `*.*` cannot be quoted; routine scopes keep their keyword in front. For
/// PROXY grants the scope is a principal and is quoted like one.
pub fn format_scope(scope: &str, proxy: bool) -> String {
    if proxy {
        return match Principal::split(scope) {
            Some(principal) => quote_principal(&principal),
            None => Ident::with_quote('\'', scope).to_string(),
        };
    }

    if scope == "*.*" {
        return scope.to_string();
    }

    for keyword in ["FUNCTION ", "PROCEDURE "] {
        if starts_with_ci(scope, keyword) {
            let rest = &scope[keyword.len()..];
            return format!("{}{}", &scope[..keyword.len()], quote_database(rest));
        }
    }

    quote_database(scope)
}

// The database name runs up to the last '.'
fn quote_database(object: &str) -> String {
    match object.rsplit_once('.') {
        Some((database, rest)) => format!("{}.{}", Ident::with_quote('`', database), rest),
        None => object.to_string(),
    }
}

/// `GRANT <privileges> ON <scope> TO <principal>[ WITH GRANT OPTION]`
pub fn grant_statement(
    identity: &GrantIdentity,
    privileges: &PrivilegeSet,
    options: GrantOptions,
) -> String {
    let mut sql = format!(
        "GRANT {} ON {} TO {}",
        format_privileges(privileges),
        format_scope(&identity.scope, privileges.is_proxy()),
        quote_principal(&identity.principal)
    );
    if options.with_grant_option() {
        sql.push_str(" WITH GRANT OPTION");
    }
    sql
}

/// Statements revoking `privileges`.
///
/// Revoking `ALL` on an object cannot carry `GRANT OPTION` in the same
/// statement, and the grant option has to go while the privileges still
/// exist, so it is revoked first on its own.
pub fn revoke_statements(identity: &GrantIdentity, privileges: &PrivilegeSet) -> Vec<String> {
    let proxy = privileges.is_proxy();
    let scope = format_scope(&identity.scope, proxy);
    let principal = quote_principal(&identity.principal);

    let mut statements = Vec::with_capacity(2);
    if privileges.has_all() && !proxy {
        statements.push(format!(
            "REVOKE GRANT OPTION ON {} FROM {}",
            scope, principal
        ));
    }
    statements.push(format!(
        "REVOKE {} ON {} FROM {}",
        format_privileges(privileges),
        scope,
        principal
    ));
    statements
}

/// Render a plan for one identity into ordered statements.
pub fn render_actions(identity: &GrantIdentity, actions: &[GrantAction]) -> Vec<Statement> {
    let mut statements = Vec::new();
    for action in actions {
        match action {
            GrantAction::Grant {
                privileges,
                options,
            } => statements.push(Statement::system(grant_statement(
                identity, privileges, *options,
            ))),
            GrantAction::Revoke { privileges } => statements.extend(
                revoke_statements(identity, privileges)
                    .into_iter()
                    .map(Statement::system),
            ),
            GrantAction::FlushPrivileges => statements.push(Statement {
                sql: FLUSH_PRIVILEGES.to_string(),
                mode: ExecMode::Regular,
            }),
        }
    }
    statements
}
