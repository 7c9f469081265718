//! Reusable form-validation primitives.
//!
//! A [`Validator`] collects field-keyed and whole-form error messages while a
//! form runs its rule set. Predicate helpers are free functions so rules read
//! as `v.check_field(not_blank(&title), "title", ...)`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Practical email format check, anchored on both ends.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex must compile")
});

/// Accumulates validation failures for a single form submission.
///
/// Field errors keep only the first message recorded per field; non-field
/// errors (whole-form failures like a credential mismatch) keep insertion
/// order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Validator {
    pub field_errors: HashMap<String, String>,
    pub non_field_errors: Vec<String>,
}

impl Validator {
    /// True iff no field errors and no non-field errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` under `field` unless the field already failed.
    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record a field error when `ok` is false.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    /// Append a whole-form error message.
    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }
}

/// True when `value` contains at least one non-whitespace character.
#[must_use]
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True when `value` is at most `n` Unicode code points long.
#[must_use]
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True when `value` is at least `n` Unicode code points long.
#[must_use]
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True when `value` matches `rx`.
#[must_use]
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

/// True when `value` equals one of `permitted_values`.
#[must_use]
pub fn permitted<T: PartialEq>(value: &T, permitted_values: &[T]) -> bool {
    permitted_values.contains(value)
}
