//! Sign-up form validation.
//!
//! The schema is declarative: each field owns an ordered rule list and the
//! first failing rule provides the message shown next to the field. Validation
//! is pure; it never talks to the network.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minimum password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

// Same grammar the HTML living standard uses for type=email inputs
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Password,
    PasswordConfirm,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Name,
        Field::Email,
        Field::Password,
        Field::PasswordConfirm,
    ];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "password",
            Field::PasswordConfirm => "password_confirm",
        };
        f.write_str(name)
    }
}

/// Raw form contents as typed by the user
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl FormInput {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::PasswordConfirm => &self.password_confirm,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Password => self.password = value,
            Field::PasswordConfirm => self.password_confirm = value,
        }
    }
}

impl fmt::Debug for FormInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Input that passed the schema. Only [`validate`] builds one.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    name: String,
    email: String,
    password: String,
}

impl ValidatedInput {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ValidatedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Per-field messages, at most one per field
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: Field, message: String) {
        self.0.insert(field, message);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Check a single field. The confirmation rule reads the password field, so
/// callers must re-check it whenever either of the two changes.
pub fn validate_field(input: &FormInput, field: Field) -> Option<String> {
    let value = input.get(field);
    match field {
        Field::Name => {
            if value.is_empty() {
                return Some("Enter your name.".into());
            }
        }
        Field::Email => {
            if value.is_empty() {
                return Some("Enter your e-mail.".into());
            }
            if !is_valid_email(value) {
                return Some("Invalid e-mail.".into());
            }
        }
        Field::Password => {
            if value.is_empty() {
                return Some("Enter your password.".into());
            }
            if value.chars().count() < MIN_PASSWORD_LEN {
                return Some(format!(
                    "Password must be at least {} characters.",
                    MIN_PASSWORD_LEN
                ));
            }
        }
        Field::PasswordConfirm => {
            if value.is_empty() {
                return Some("Confirm your password.".into());
            }
            if value != input.password {
                return Some("Password confirmation does not match.".into());
            }
        }
    }
    None
}

/// Validate the whole form
pub fn validate(input: &FormInput) -> Result<ValidatedInput, FieldErrors> {
    let mut errors = FieldErrors::default();
    for field in Field::ALL {
        if let Some(message) = validate_field(input, field) {
            errors.insert(field, message);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedInput {
        name: input.name.clone(),
        email: input.email.clone(),
        password: input.password.clone(),
    })
}
