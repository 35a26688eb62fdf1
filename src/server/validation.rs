//! Form input and field validation.
//!
//! Every field's checks run independently and all failures are collected.
//! Within one field, a blank required value reports only the "required"
//! message; the remaining checks only run on non-blank input.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::highlight::DEFAULT_LANGUAGE;

pub const USERNAME_REQUIRED: &str = "The username field is required.";
pub const USERNAME_LENGTH: &str = "The username must be between 3 and 100 chars long.";
pub const EMAIL_REQUIRED: &str = "The email address field is required.";
pub const EMAIL_LENGTH: &str = "The email address must be between 4 and 100 chars long.";
pub const PASSWORD_REQUIRED: &str = "The password field is required.";
pub const PASSWORD_LENGTH: &str = "The password must be at least 8 characters long.";
pub const PASSWORD_MISMATCH: &str = "The two passwords must match.";
pub const USERNAME_TAKEN: &str = "Username has already been taken.";
pub const EMAIL_TAKEN: &str = "Email address has already been used.";

pub const LOGIN_USERNAME_REQUIRED: &str = "You must enter a username.";
pub const LOGIN_PASSWORD_REQUIRED: &str = "You must enter a password.";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub const TITLE_REQUIRED: &str = "You must enter a title.";
pub const TITLE_LENGTH: &str = "The title must be at most 100 characters long.";
pub const LANGUAGE_LENGTH: &str = "The language tag must be at most 30 characters long.";
pub const CONTENT_REQUIRED: &str = "You must enter some source code.";

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 100;
const EMAIL_MIN: usize = 4;
const EMAIL_MAX: usize = 100;
const PASSWORD_MIN: usize = 8;
const TITLE_MAX: usize = 100;
const LANGUAGE_MAX: usize = 30;

/// Field name to messages. Empty means the form is valid.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn errors(&self) -> &BTreeMap<&'static str, Vec<String>> {
        &self.errors
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Runs `checks` only when the required field is filled in.
fn required(
    result: &mut ValidationResult,
    field: &'static str,
    value: &str,
    message: &str,
    checks: impl FnOnce(&mut ValidationResult),
) {
    if is_blank(value) {
        result.add(field, message);
    } else {
        checks(result);
    }
}

fn length_between(
    result: &mut ValidationResult,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    message: &str,
) {
    let len = char_len(value);
    if len < min || len > max {
        result.add(field, message);
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
}

impl RegistrationForm {
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        required(&mut result, "username", &self.username, USERNAME_REQUIRED, |r| {
            length_between(r, "username", &self.username, USERNAME_MIN, USERNAME_MAX, USERNAME_LENGTH);
        });

        required(&mut result, "email", &self.email, EMAIL_REQUIRED, |r| {
            length_between(r, "email", &self.email, EMAIL_MIN, EMAIL_MAX, EMAIL_LENGTH);
        });

        required(&mut result, "password", &self.password, PASSWORD_REQUIRED, |r| {
            length_between(r, "password", &self.password, PASSWORD_MIN, usize::MAX, PASSWORD_LENGTH);
            if self.password != self.confirm_password {
                r.add("password", PASSWORD_MISMATCH);
            }
        });

        result
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        required(&mut result, "username", &self.username, LOGIN_USERNAME_REQUIRED, |_| {});
        required(&mut result, "password", &self.password, LOGIN_PASSWORD_REQUIRED, |_| {});
        result
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SnippetForm {
    pub title: String,
    pub language: String,
    pub raw_content: String,
}

impl SnippetForm {
    /// The tag to store. Any tag is accepted; unknown ones render as plain text.
    #[must_use]
    pub fn language_tag(&self) -> String {
        let tag = self.language.trim();
        if tag.is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            tag.to_ascii_lowercase()
        }
    }

    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        required(&mut result, "title", &self.title, TITLE_REQUIRED, |r| {
            length_between(r, "title", &self.title, 1, TITLE_MAX, TITLE_LENGTH);
        });

        length_between(&mut result, "language", &self.language_tag(), 1, LANGUAGE_MAX, LANGUAGE_LENGTH);

        required(&mut result, "raw_content", &self.raw_content, CONTENT_REQUIRED, |_| {});

        result
    }
}
