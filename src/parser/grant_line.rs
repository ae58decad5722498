//! Tokenizer for single `SHOW GRANTS` output lines.

use std::sync::LazyLock;

use regex::Regex;

// GRANT <privileges> ON <scope> TO <user>@<host>[ <modifiers>]
// Privileges, scope, and user are greedy; the host stops at the first blank.
static GRANT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^GRANT\s(.+)\sON\s(.+)\sTO\s(.*)@(.*?)(\s.*)?$").unwrap()
});

static GRANT_OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)WITH\s+GRANT\s+OPTION").unwrap());

/// Fields captured from one grant line, with quoting already removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantLine {
    pub privileges: String,
    pub scope: String,
    pub user: String,
    pub host: String,
    /// Everything after the host, e.g. ` WITH GRANT OPTION`; may be empty
    pub modifiers: String,
}

impl GrantLine {
    pub fn with_grant_option(&self) -> bool {
        GRANT_OPTION_RE.is_match(&self.modifiers)
    }
}

/// Result of tokenizing one line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Matched(GrantLine),
    /// Banners, blank lines, role grants, and anything else without the
    /// `GRANT .. ON .. TO ..@..` shape
    Skipped,
}

/// Remove every single quote, backtick, and double quote.
pub fn strip_quotes(line: &str) -> String {
    line.chars()
        .filter(|c| !matches!(c, '\'' | '`' | '"'))
        .collect()
}

/// Collapse the doubled backslashes the engine prints in escaped database
/// names (`test\\_db` becomes `test\_db`).
pub fn unescape_scope(scope: &str) -> String {
    scope.replace("\\\\", "\\")
}

/// Tokenize one line of `SHOW GRANTS` output.
pub fn tokenize_line(line: &str) -> ParsedLine {
    let line = line.trim_end_matches(['\r', '\n']);
    let unquoted = strip_quotes(line);

    let Some(caps) = GRANT_LINE_RE.captures(&unquoted) else {
        return ParsedLine::Skipped;
    };
    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();

    ParsedLine::Matched(GrantLine {
        privileges: field(1),
        scope: unescape_scope(&field(2)),
        user: field(3),
        host: field(4),
        modifiers: field(5),
    })
}
