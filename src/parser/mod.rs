//! `SHOW GRANTS` parsing

mod grant_line;
mod grant_parser;
mod privileges;

pub use grant_line::{strip_quotes, tokenize_line, unescape_scope, GrantLine, ParsedLine};
pub use grant_parser::{is_no_grants_defined, GrantParser, NO_SUCH_GRANT};
pub use privileges::{normalize_privilege, normalize_privilege_list, split_privilege_list};
