//! Core domain types for the gym screens.
//!
//! This module defines the values that flow between the screens and their
//! collaborators:
//! - Filter dimensions (muscle groups) and exercises
//! - Notifications shown to the user
//! - Account and credential payloads sent to the API

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Listing Types
// ============================================================================

/// One selectable value of the filter axis (a muscle group name).
///
/// The server is the source of truth: no normalization, no uniqueness.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FilterDimension(String);

impl FilterDimension {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilterDimension {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An exercise as returned by the exercises-by-group endpoint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub group: FilterDimension,
    #[serde(default)]
    pub series: Option<u32>,
    #[serde(default)]
    pub repetitions: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub demo: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The API hands out numeric ids; the app treats them as opaque strings.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

// ============================================================================
// Notification Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Top,
    Bottom,
}

/// A transient message for the user. No identity beyond what is displayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub severity: Severity,
    pub placement: Placement,
}

impl Notification {
    /// Failure toast as both screens show it: red, at the top
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            severity: Severity::Error,
            placement: Placement::Top,
        }
    }

    /// Confirmation toast: green, at the bottom
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            severity: Severity::Success,
            placement: Placement::Bottom,
        }
    }
}

// ============================================================================
// Account Types
// ============================================================================

/// Body of the create-account call
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of the sign-in call
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
