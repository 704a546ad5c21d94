//! Input validation rules shared by services and request types.

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationErrors;

/// Number of digits in a CNP.
pub const CNP_LENGTH: usize = 13;

/// Exactly [`CNP_LENGTH`] ASCII digits.
#[allow(clippy::expect_used)]
pub static CNP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^[0-9]{{{CNP_LENGTH}}}$")).expect("CNP pattern compiles")
});

/// Flatten validator errors into the first human-readable message.
///
/// Fields are visited in name order so the reported constraint is stable
/// when several fields fail at once.
#[must_use]
pub fn first_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| {
                e.message
                    .as_ref()
                    .map_or_else(|| format!("{field}: {}", e.code), ToString::to_string)
            })
        })
        .unwrap_or_else(|| "Validation error".to_string())
}
