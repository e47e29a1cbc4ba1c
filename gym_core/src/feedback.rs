//! User feedback for failed remote calls.
//!
//! One rule for every call site: a server-classified message is shown
//! verbatim, anything else becomes the fixed fallback for that operation.

use crate::Notification;
use serde::{Deserialize, Serialize};

/// Collaborator that renders a transient message. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn show(&self, notification: Notification);
}

/// Remote operations that can fail in front of the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    LoadGroups,
    LoadExercises,
    CreateAccount,
}

/// Fallback titles keyed by operation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FallbackMessages {
    #[serde(default = "default_load_groups")]
    pub load_groups: String,

    #[serde(default = "default_load_exercises")]
    pub load_exercises: String,

    #[serde(default = "default_create_account")]
    pub create_account: String,
}

impl Default for FallbackMessages {
    fn default() -> Self {
        Self {
            load_groups: default_load_groups(),
            load_exercises: default_load_exercises(),
            create_account: default_create_account(),
        }
    }
}

fn default_load_groups() -> String {
    "could not load filter dimensions".into()
}

fn default_load_exercises() -> String {
    "could not load items".into()
}

fn default_create_account() -> String {
    "could not create account".into()
}

impl FallbackMessages {
    pub fn fallback_for(&self, operation: Operation) -> &str {
        match operation {
            Operation::LoadGroups => &self.load_groups,
            Operation::LoadExercises => &self.load_exercises,
            Operation::CreateAccount => &self.create_account,
        }
    }

    /// Title to show for a failed `operation`
    pub fn title_for(&self, operation: Operation, domain_message: Option<&str>) -> String {
        domain_message
            .unwrap_or_else(|| self.fallback_for(operation))
            .to_string()
    }

    /// Build the failure notification for `operation`
    pub fn failure(&self, operation: Operation, domain_message: Option<&str>) -> Notification {
        Notification::error(self.title_for(operation, domain_message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Placement, RemoteError, Severity};

    #[test]
    fn test_domain_message_passes_through() {
        let messages = FallbackMessages::default();
        let err = RemoteError::domain("Group not found");
        let notification = messages.failure(Operation::LoadExercises, err.domain_message());

        assert_eq!(notification.title, "Group not found");
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.placement, Placement::Top);
    }

    #[test]
    fn test_transport_error_uses_fallback() {
        let messages = FallbackMessages::default();
        let err = RemoteError::transport("tcp connect error: Connection refused (os error 111)");

        assert_eq!(
            messages.title_for(Operation::LoadGroups, err.domain_message()),
            "could not load filter dimensions"
        );
        assert_eq!(
            messages.title_for(Operation::LoadExercises, err.domain_message()),
            "could not load items"
        );
        assert_eq!(
            messages.title_for(Operation::CreateAccount, err.domain_message()),
            "could not create account"
        );
    }

    #[test]
    fn test_partial_messages_table() {
        let messages: FallbackMessages =
            toml::from_str(r#"load_exercises = "Exercises unavailable""#).unwrap();
        assert_eq!(messages.load_exercises, "Exercises unavailable");
        assert_eq!(messages.load_groups, "could not load filter dimensions");
    }
}
