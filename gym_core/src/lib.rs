#![forbid(unsafe_code)]

//! Core logic behind the gym app's home and sign-up screens.
//!
//! This crate provides:
//! - Domain types (muscle groups, exercises, notifications)
//! - The transport contract and its HTTP implementation
//! - A remote list synchronizer and the home screen driver around it
//! - Sign-up form validation and the submission pipeline
//! - Session establishment and persistence
//! - Configuration and logging

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod feedback;
pub mod navigation;
pub mod transport;
pub mod http;
pub mod session;
pub mod sync;
pub mod home;
pub mod validation;
pub mod signup;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{AuthError, Error, RemoteError, Result};
pub use types::*;
pub use config::Config;
pub use feedback::{FallbackMessages, Notifier, Operation};
pub use navigation::{Navigator, Route};
pub use transport::{Resource, Transport};
pub use http::HttpTransport;
pub use session::{RemoteSessionEstablisher, SessionEstablisher, SessionStore, StoredSession};
pub use sync::{ListSynchronizer, SyncSnapshot};
pub use home::HomeScreen;
pub use validation::{validate, Field, FieldErrors, FormInput, ValidatedInput};
pub use signup::{SignUpError, SignUpPipeline, SignUpScreen, SubmissionError, SubmissionPhase};
