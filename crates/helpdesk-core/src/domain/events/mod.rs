//! Domain Events
//!
//! Immutable facts describing what happened to a ticket.

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{EscalationLevel, EscalationTarget, Relationship, TicketStatus};
use crate::domain::value_objects::{TicketId, Timestamp, UserId};

/// Audit record of one escalation occurrence. Not part of ticket state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEscalation {
    pub ticket_id: TicketId,
    pub level: EscalationLevel,
    pub timestamp: Timestamp,
    pub reason: String,
    pub escalated_to: EscalationTarget,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
    Created {
        ticket_id: TicketId,
        created_by: UserId,
        at: Timestamp,
    },
    StatusChanged {
        ticket_id: TicketId,
        from: TicketStatus,
        to: TicketStatus,
        actor: Option<UserId>,
        at: Timestamp,
    },
    Assigned {
        ticket_id: TicketId,
        assignee: UserId,
        at: Timestamp,
    },
    Escalated(TicketEscalation),
    Tagged {
        ticket_id: TicketId,
        tag: String,
    },
    Untagged {
        ticket_id: TicketId,
        tag: String,
    },
    Linked {
        ticket_id: TicketId,
        target_id: TicketId,
        relationship: Relationship,
    },
    Unlinked {
        ticket_id: TicketId,
        target_id: TicketId,
    },
}

impl TicketEvent {
    pub fn ticket_id(&self) -> &TicketId {
        match self {
            Self::Created { ticket_id, .. }
            | Self::StatusChanged { ticket_id, .. }
            | Self::Assigned { ticket_id, .. }
            | Self::Tagged { ticket_id, .. }
            | Self::Untagged { ticket_id, .. }
            | Self::Linked { ticket_id, .. }
            | Self::Unlinked { ticket_id, .. } => ticket_id,
            Self::Escalated(escalation) => &escalation.ticket_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created { .. } => "ticket.created",
            Self::StatusChanged { .. } => "ticket.status_changed",
            Self::Assigned { .. } => "ticket.assigned",
            Self::Escalated(_) => "ticket.escalated",
            Self::Tagged { .. } => "ticket.tagged",
            Self::Untagged { .. } => "ticket.untagged",
            Self::Linked { .. } => "ticket.linked",
            Self::Unlinked { .. } => "ticket.unlinked",
        }
    }
}
