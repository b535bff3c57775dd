//! Field validation rules
//! Pure checks over a field's value, required flag and kind. No rendering here.

use regex::Regex;
use std::sync::OnceLock;

use super::{FieldError, FieldKind};

// `\s` here omits U+FEFF, so it is excluded explicitly
const EMAIL_PATTERN: &str = r"^[^\s@\x{FEFF}]+@[^\s@\x{FEFF}]+\.[^\s@\x{FEFF}]+$";
const PHONE_PATTERN: &str = r"^[+]?[1-9][0-9]{0,15}$";

static EMAIL: OnceLock<Regex> = OnceLock::new();
static PHONE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    // Pattern is a compile-time constant
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).unwrap())
}

fn phone_regex() -> &'static Regex {
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).unwrap())
}

/// Evaluate a field value against the rule for its kind.
///
/// Order matters: an empty required field reports `Required` regardless of kind,
/// and kind rules only apply to non-empty values.
pub fn check_value(value: &str, required: bool, kind: FieldKind) -> Result<(), FieldError> {
    let value = value.trim_matches(is_blank);

    if value.is_empty() {
        return if required { Err(FieldError::Required) } else { Ok(()) };
    }

    match kind {
        FieldKind::Email if !is_email(value) => Err(FieldError::InvalidEmail),
        FieldKind::Tel if !is_phone(value) => Err(FieldError::InvalidPhone),
        _ => Ok(()),
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@` boundary
pub fn is_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// Optional leading `+`, then 1-16 digits not starting with 0. Whitespace anywhere is ignored.
pub fn is_phone(value: &str) -> bool {
    let stripped = strip_whitespace(value);
    phone_regex().is_match(&stripped)
}

/// Unicode whitespace plus the byte-order mark, which `char::is_whitespace` skips
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|&c| !is_blank(c)).collect()
}
