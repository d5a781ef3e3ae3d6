//! SQL identifier validation.
//!
//! Physical table and column names end up verbatim in generated SQL, so the
//! validator rejects anything that is not a plain identifier. The pattern is
//! compiled once and cached for the lifetime of the program.

use std::sync::OnceLock;

use regex::Regex;

/// Pattern for valid unquoted SQL identifiers.
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// Maximum identifier length accepted across supported dialects.
///
/// PostgreSQL truncates at 63 bytes; staying under that bound keeps
/// synthesized junction and foreign-key names portable.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Check whether `name` is a valid unquoted SQL identifier.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LENGTH && identifier_pattern().is_match(name)
}
