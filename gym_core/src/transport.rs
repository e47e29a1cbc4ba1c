//! Transport contract between the screens and the remote API.
//!
//! The screens name *what* they want through [`Resource`]; how it travels is the
//! transport's business. Every failure comes back already classified as a
//! [`RemoteError`], so call sites never inspect error internals.

use crate::{FilterDimension, RemoteError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Remote resources used by the two screens
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    /// All muscle groups
    Groups,
    /// Exercises belonging to one muscle group
    ExercisesByGroup(FilterDimension),
    /// Account creation
    Users,
    /// Sign-in
    Sessions,
}

impl Resource {
    /// Path segments relative to the API base URL (unencoded)
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Resource::Groups => vec!["groups"],
            Resource::ExercisesByGroup(group) => vec!["exercises", "bygroup", group.as_str()],
            Resource::Users => vec!["users"],
            Resource::Sessions => vec!["sessions"],
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments().join("/"))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, resource: &Resource) -> Result<Value, RemoteError>;

    async fn post(&self, resource: &Resource, body: Value) -> Result<Value, RemoteError>;

    /// Attach (or clear) the bearer token used for subsequent calls
    fn set_auth_token(&self, _token: Option<String>) {}
}

/// Decode a payload; a shape mismatch is a transport failure, not a domain one.
pub fn decode<T: DeserializeOwned>(resource: &Resource, payload: Value) -> Result<T, RemoteError> {
    serde_json::from_value(payload).map_err(|e| {
        tracing::warn!("Unexpected payload from {}: {}", resource, e);
        RemoteError::transport(format!("failed to decode {}: {}", resource, e))
    })
}
