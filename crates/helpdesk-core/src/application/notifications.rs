//! Notification dispatch
//!
//! Turns ticket deltas and escalations into notification events for the
//! sink. Recipients with the `user` role never receive anything that
//! mentions an escalation.

use std::sync::Arc;

use crate::config::OrganizationConfig;
use crate::domain::aggregates::{EscalationLevel, Role, Ticket, TicketStatus, User};
use crate::domain::events::TicketEscalation;
use crate::domain::services::sla::tickets_nearing_breach;
use crate::domain::value_objects::Timestamp;
use crate::ports::outbound::{Notification, NotificationCategory, NotificationKind, NotificationSink};

pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    config: Arc<OrganizationConfig>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, config: Arc<OrganizationConfig>) -> Self {
        Self { sink, config }
    }

    /// Deliver unless the recipient's role hides it. Returns whether it was delivered.
    pub fn notify(&self, notification: Notification, recipient_role: Role) -> bool {
        if !notification.visible_to(recipient_role) {
            tracing::debug!(
                user_id = %notification.user_id,
                title = %notification.title,
                "notification hidden from end user"
            );
            return false;
        }
        self.sink.deliver(notification);
        true
    }

    /// Notifications for the difference between `old` and `new`.
    ///
    /// Nothing is sent without an acting user.
    pub fn ticket_changed(&self, old: &Ticket, new: &Ticket, actor: Option<&User>) -> Vec<Notification> {
        let Some(actor) = actor else {
            return vec![];
        };
        let settings = &self.config.notifications;
        let mut sent = Vec::new();

        let status_changed = old.status() != new.status();
        if status_changed && settings.on_ticket_update {
            let creator = new.created_by();
            let note = Notification::new(
                "Ticket Status Updated",
                format!(
                    "Your ticket #{} has been updated to: {}",
                    new.id(),
                    self.config.stage_name(new.status())
                ),
                NotificationKind::Info,
                creator.id.clone(),
            )
            .for_ticket(new.id());
            self.push(&mut sent, note, creator.role.unwrap_or(Role::User));
        } else if status_changed {
            tracing::debug!(ticket_id = %new.id(), "status notification disabled");
        }

        let assignee_changed = old.assignee().map(|a| &a.id) != new.assignee().map(|a| &a.id);
        if let Some(assignee) = new.assignee().filter(|_| assignee_changed) {
            if settings.on_ticket_assignment {
                let note = Notification::new(
                    "New Ticket Assigned",
                    format!("Ticket #{} has been assigned to you: \"{}\"", new.id(), new.title()),
                    NotificationKind::Info,
                    assignee.id.clone(),
                )
                .for_ticket(new.id());
                self.push(&mut sent, note, assignee.role.unwrap_or(Role::Agent));
            } else {
                tracing::debug!(ticket_id = %new.id(), "assignment notification disabled");
            }
        }

        if status_changed
            && new.status() == TicketStatus::Resolved
            && settings.on_ticket_resolution
            && actor.role.is_supervisory()
        {
            let note = Notification::new(
                "Ticket Resolved",
                format!("Ticket #{} has been marked as resolved by {}", new.id(), actor.name),
                NotificationKind::Success,
                actor.id.clone(),
            )
            .for_ticket(new.id());
            self.push(&mut sent, note, actor.role);
        }

        sent
    }

    /// Assignment notice for a ticket created with an assignee
    pub fn ticket_created(&self, ticket: &Ticket) -> Vec<Notification> {
        let mut sent = Vec::new();
        let Some(assignee) = ticket.assignee() else {
            return sent;
        };
        if !self.config.notifications.on_ticket_assignment {
            return sent;
        }
        let note = Notification::new(
            "New Ticket Assigned",
            format!("Ticket #{} has been assigned to you by {}", ticket.id(), ticket.created_by().name),
            NotificationKind::Info,
            assignee.id.clone(),
        )
        .for_ticket(ticket.id());
        self.push(&mut sent, note, assignee.role.unwrap_or(Role::Agent));
        sent
    }

    /// Notify the escalation target and the ticket creator.
    ///
    /// A creator with the `user` role, or with no recorded role, only
    /// hears that the ticket is being processed.
    pub fn escalated(&self, ticket: &Ticket, escalation: &TicketEscalation) -> Vec<Notification> {
        let mut sent = Vec::new();
        let target = &escalation.escalated_to;

        let (title, message, kind) = match escalation.level {
            EscalationLevel::Manager => (
                "Ticket Escalated to Management",
                format!("Ticket #{} has been escalated to management level: {}", ticket.id(), escalation.reason),
                NotificationKind::Error,
            ),
            _ => (
                "Ticket Escalated",
                format!("Ticket #{} has been escalated to you: {}", ticket.id(), escalation.reason),
                NotificationKind::Warning,
            ),
        };
        let note = Notification::new(title, message, kind, target.id.clone())
            .for_ticket(ticket.id())
            .in_category(NotificationCategory::Escalation);
        self.push(&mut sent, note, target.role);

        let creator = ticket.created_by();
        let creator_role = creator.role.unwrap_or(Role::User);
        let note = if creator_role == Role::User {
            Notification::new(
                "Your Ticket Has Been Updated",
                format!("Your ticket #{} is being processed by our support team", ticket.id()),
                NotificationKind::Info,
                creator.id.clone(),
            )
            .for_ticket(ticket.id())
        } else {
            Notification::new(
                "Your Ticket Has Been Escalated",
                format!(
                    "Your ticket #{} has been escalated to a {} for resolution",
                    ticket.id(),
                    escalation.level.target_label()
                ),
                NotificationKind::Info,
                creator.id.clone(),
            )
            .for_ticket(ticket.id())
            .in_category(NotificationCategory::Escalation)
        };
        self.push(&mut sent, note, creator_role);

        sent
    }

    /// Alerts for active tickets close to breaching, addressed to `viewer`.
    /// Only supervisory viewers get them.
    pub fn sla_alerts(&self, tickets: &[Ticket], viewer: &User, now: Timestamp) -> Vec<Notification> {
        let mut sent = Vec::new();
        if !self.config.notifications.on_sla_breach || !viewer.role.is_supervisory() {
            return sent;
        }
        let Some(window) = self.config.sla.critical_window() else {
            return sent;
        };
        for (ticket, left) in tickets_nearing_breach(tickets, now, window) {
            let note = Notification::new(
                "SLA Alert",
                format!("Ticket #{} has {} minutes until SLA breach", ticket.id(), left.num_minutes()),
                NotificationKind::Warning,
                viewer.id.clone(),
            )
            .for_ticket(ticket.id())
            .in_category(NotificationCategory::Escalation);
            self.push(&mut sent, note, viewer.role);
        }
        sent
    }

    fn push(&self, sent: &mut Vec<Notification>, note: Notification, role: Role) {
        if self.notify(note.clone(), role) {
            sent.push(note);
        }
    }
}
