//! Typed forms for every POST endpoint.
//!
//! Each form derives `Deserialize` with `#[serde(default)]` so it can be
//! populated by [`decode`] from the submitted fields, and holds a
//! [`Validator`] by composition: `validate()` runs the form's rule set
//! against it, and the populated form (errors included) is handed back to
//! the template on failure.

use serde::{Deserialize, Serialize};

use crate::validator::{matches, max_chars, min_chars, not_blank, permitted, Validator, EMAIL_RX};

mod decode;
pub use decode::{decode, DecodeError};

pub const BLANK_FIELD: &str = "This field cannot be blank";

/// Snippet creation: title, content and an expiry chosen from a fixed set of
/// day counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i32,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    /// Initial form shown on GET, with the expiry preselected.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            expires: 365,
            ..Self::default()
        }
    }

    /// Run every rule; errors accumulate rather than short-circuit.
    pub fn validate(&mut self) {
        self.validator
            .check_field(not_blank(&self.title), "title", BLANK_FIELD);
        self.validator.check_field(
            max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        self.validator
            .check_field(not_blank(&self.content), "content", BLANK_FIELD);
        self.validator.check_field(
            permitted(&self.expires, &[1, 7, 365]),
            "expires",
            "This field must equal 1, 7 or 365",
        );
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validator.is_valid()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) {
        self.validator
            .check_field(not_blank(&self.name), "name", BLANK_FIELD);
        self.validator
            .check_field(not_blank(&self.email), "email", BLANK_FIELD);
        self.validator.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        self.validator
            .check_field(not_blank(&self.password), "password", BLANK_FIELD);
        self.validator.check_field(
            min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long",
        );
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validator.is_valid()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserLoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) {
        self.validator
            .check_field(not_blank(&self.email), "email", BLANK_FIELD);
        self.validator.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        self.validator
            .check_field(not_blank(&self.password), "password", BLANK_FIELD);
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validator.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn snippet_form_decodes_and_passes() {
        let raw = fields(&[
            ("title", "O snail"),
            ("content", "Climb Mount Fuji,\nBut slowly, slowly!"),
            ("expires", "7"),
        ]);
        let mut form: SnippetCreateForm = decode(&raw).unwrap();
        form.validate();
        assert!(form.is_valid());
        assert_eq!(form.expires, 7);
    }

    #[test]
    fn blank_title_yields_exactly_one_title_error() {
        let mut form = SnippetCreateForm {
            title: String::new(),
            content: "valid".to_string(),
            expires: 7,
            ..SnippetCreateForm::default()
        };
        form.validate();
        assert!(!form.is_valid());
        assert_eq!(form.validator.field_errors.len(), 1);
        assert_eq!(form.validator.field_errors["title"], BLANK_FIELD);
    }

    #[test]
    fn whitespace_title_is_blank_and_first_error_wins() {
        let mut form = SnippetCreateForm {
            title: "   ".to_string(),
            content: "valid".to_string(),
            expires: 7,
            ..SnippetCreateForm::default()
        };
        form.validate();
        assert_eq!(form.validator.field_errors["title"], BLANK_FIELD);
    }

    #[test]
    fn overlong_title_counts_code_points() {
        let mut form = SnippetCreateForm {
            title: "\u{00e9}".repeat(101),
            content: "valid".to_string(),
            expires: 1,
            ..SnippetCreateForm::default()
        };
        form.validate();
        assert_eq!(form.validator.field_errors.len(), 1);
        assert!(form.validator.field_errors.contains_key("title"));
    }

    #[test]
    fn unlisted_expiry_yields_exactly_one_expires_error() {
        let mut form = SnippetCreateForm {
            title: "ok".to_string(),
            content: "ok".to_string(),
            expires: 3,
            ..SnippetCreateForm::default()
        };
        form.validate();
        assert!(!form.is_valid());
        assert_eq!(form.validator.field_errors.len(), 1);
        assert_eq!(
            form.validator.field_errors["expires"],
            "This field must equal 1, 7 or 365"
        );
    }

    #[test]
    fn all_rules_run_even_after_earlier_failures() {
        let mut form = SnippetCreateForm::default();
        form.validate();
        // title blank, content blank, expires 0: three failed fields at once.
        assert_eq!(form.validator.field_errors.len(), 3);
    }

    #[test]
    fn signup_form_rejects_bad_email_and_short_password() {
        let mut form = UserSignupForm {
            name: "Alice".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            ..UserSignupForm::default()
        };
        form.validate();
        assert_eq!(
            form.validator.field_errors["email"],
            "This field must be a valid email address"
        );
        assert_eq!(
            form.validator.field_errors["password"],
            "This field must be at least 8 characters long"
        );
    }

    #[test]
    fn login_form_accepts_wellformed_credentials() {
        let mut form = UserLoginForm {
            email: "alice@example.com".to_string(),
            password: "pa55word".to_string(),
            ..UserLoginForm::default()
        };
        form.validate();
        assert!(form.is_valid());
    }

    #[test]
    fn non_numeric_expires_is_a_decode_error_not_a_validation_error() {
        let raw = fields(&[("title", "t"), ("content", "c"), ("expires", "never")]);
        assert!(matches!(
            decode::<SnippetCreateForm>(&raw),
            Err(DecodeError::Malformed { .. })
        ));
    }
}
