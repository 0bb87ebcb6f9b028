//! Workflow State Machine
//!
//! The transition table in [`can_update_ticket_status`] is the only source
//! of truth for which status changes are allowed. Elapsed time never moves a
//! ticket between statuses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::aggregates::{Role, Ticket, TicketStatus, User};
use crate::domain::value_objects::Timestamp;
use crate::domain::TicketError;

/// Transition guard, total over every (role, from, to) triple
pub fn can_update_ticket_status(role: Role, from: TicketStatus, to: TicketStatus) -> bool {
    use TicketStatus::*;

    match role {
        Role::Admin | Role::Manager => true,
        Role::TeamLeader => to != Closed || from == Resolved,
        Role::Agent => matches!((from, to), (Open, InProgress) | (InProgress, Resolved)),
        Role::User | Role::Unknown => false,
    }
}

/// Apply a guarded status change.
///
/// Returns a new ticket with the new status and a strictly later `updated`;
/// `ticket` itself is left as it was. A missing actor is denied.
pub fn update_ticket_status(
    ticket: &Ticket,
    new_status: TicketStatus,
    actor: Option<&User>,
    now: Timestamp,
) -> Result<Ticket, TicketError> {
    let allowed = actor.is_some_and(|u| can_update_ticket_status(u.role, ticket.status(), new_status));
    if !allowed {
        tracing::debug!(
            ticket_id = %ticket.id(),
            from = %ticket.status(),
            to = %new_status,
            role = actor.map(|u| u.role.as_str()).unwrap_or("none"),
            "status transition denied"
        );
        return Err(TicketError::status_permission_denied());
    }

    let mut next = ticket.clone();
    next.status = new_status;
    next.touch(now);
    Ok(next)
}

/// Actions offered for a ticket. Advisory only: whatever the user picks
/// still goes through the transition guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    Assign,
    StartWork,
    Escalate,
    Close,
    Resolve,
    Reassign,
    Reopen,
}

impl TicketAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::StartWork => "start_work",
            Self::Escalate => "escalate",
            Self::Close => "close",
            Self::Resolve => "resolve",
            Self::Reassign => "reassign",
            Self::Reopen => "reopen",
        }
    }

    /// Status the action moves to; assignment and escalation keep the status
    pub fn next_status(&self) -> Option<TicketStatus> {
        match self {
            Self::StartWork => Some(TicketStatus::InProgress),
            Self::Resolve => Some(TicketStatus::Resolved),
            Self::Close => Some(TicketStatus::Closed),
            Self::Reopen => Some(TicketStatus::Open),
            Self::Assign | Self::Reassign | Self::Escalate => None,
        }
    }
}

impl fmt::Display for TicketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assign" => Ok(Self::Assign),
            "start_work" => Ok(Self::StartWork),
            "escalate" => Ok(Self::Escalate),
            "close" => Ok(Self::Close),
            "resolve" => Ok(Self::Resolve),
            "reassign" => Ok(Self::Reassign),
            "reopen" => Ok(Self::Reopen),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

pub fn available_actions(ticket: &Ticket, role: Role) -> Vec<TicketAction> {
    use TicketAction::*;

    let supervisory = role.is_supervisory();
    let mut actions = Vec::new();
    match ticket.status() {
        TicketStatus::Open => {
            actions.extend([Assign, StartWork]);
            if supervisory {
                actions.extend([Escalate, Close]);
            }
        }
        TicketStatus::InProgress => {
            actions.push(Resolve);
            if supervisory {
                actions.extend([Reassign, Escalate]);
            }
        }
        TicketStatus::Resolved => actions.extend([Close, Reopen]),
        TicketStatus::Closed => {
            if supervisory {
                actions.push(Reopen);
            }
        }
    }
    actions
}

pub fn next_status_for_action(action: TicketAction) -> Option<TicketStatus> {
    action.next_status()
}
