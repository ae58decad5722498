//! Privilege list splitting and normalization.
//!
//! The same normalizer is applied to engine output and to desired-state
//! input so the two compare equal whenever they mean the same thing.

use crate::model::{PrivilegeSet, ALL};
use crate::util::squash_whitespace;

/// Split a privilege list on commas that are not inside parentheses.
///
/// `SELECT (a, b), UPDATE (c)` yields `["SELECT (a, b)", "UPDATE (c)"]`.
/// Empty entries are dropped.
pub fn split_privilege_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Normalize a single privilege token.
///
/// - `select (b,a,a)` becomes `SELECT (a, b)`: upper-cased name, column list
///   deduplicated, sorted, and joined with `", "`.
/// - `all privileges` becomes `ALL`.
/// - anything else is upper-cased with whitespace runs collapsed.
pub fn normalize_privilege(token: &str) -> String {
    if let Some(open) = token.find('(') {
        let name = squash_whitespace(&token[..open]).to_uppercase();
        let close = token.rfind(')').filter(|&close| close > open);
        let inner = match close {
            Some(close) => &token[open + 1..close],
            None => &token[open + 1..],
        };
        return format!("{} ({})", name, normalize_column_list(inner));
    }

    let squashed = squash_whitespace(token).to_uppercase();
    if squashed == "ALL PRIVILEGES" {
        ALL.to_string()
    } else {
        squashed
    }
}

/// Sort and deduplicate a comma-separated column list.
fn normalize_column_list(inner: &str) -> String {
    let mut columns: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    columns.sort_unstable();
    columns.dedup();
    columns.join(", ")
}

/// Split and normalize a whole privilege list into a set.
pub fn normalize_privilege_list(list: &str) -> PrivilegeSet {
    split_privilege_list(list)
        .into_iter()
        .map(normalize_privilege)
        .collect()
}
