use crate::models::UserId;

/// Requester is not the configured principal. An expected outcome, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Access denied for user {requester}")]
    AccessDenied { requester: UserId },
}
