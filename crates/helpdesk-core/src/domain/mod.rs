//! Domain module
//!
//! Ticket aggregate, value objects, events and the pure services that
//! implement the workflow and escalation rules.

pub mod aggregates;
pub mod value_objects;
pub mod events;
pub mod services;

pub use aggregates::*;
pub use value_objects::*;
pub use events::*;

use thiserror::Error;

/// Message surfaced to the user when a status transition is denied.
pub const STATUS_PERMISSION_DENIED: &str = "You don't have permission to update this ticket's status";

/// Domain errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// Authorization denial; the caller shows the reason and does not mutate state
    #[error("{reason}")]
    PermissionDenied { reason: String },

    #[error("Request {0} not found")]
    TicketNotFound(TicketId),

    #[error("A ticket cannot be linked to itself")]
    SelfLink,

    #[error("Ticket {source_id} is already linked to {target_id}")]
    AlreadyLinked { source_id: TicketId, target_id: TicketId },

    #[error("No escalation target found for level {level}")]
    EscalationTargetMissing { level: EscalationLevel },

    #[error("Escalation rejected: {reason}")]
    EscalationRejected { reason: String },
}

impl TicketError {
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied { reason: reason.into() }
    }

    pub fn status_permission_denied() -> Self {
        Self::permission_denied(STATUS_PERMISSION_DENIED)
    }

    /// Expected, user-facing outcome rather than a failure worth logging as an error
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}
