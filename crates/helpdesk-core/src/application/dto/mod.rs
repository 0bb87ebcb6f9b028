//! Data Transfer Objects (DTOs)
//!
//! Read models handed to adapters. Workflow details are only filled in for
//! viewers allowed to see them.

use serde::Serialize;

use crate::config::SlaSettings;
use crate::domain::aggregates::{Role, Ticket};
use crate::domain::services::permissions::can_view_workflow_details;
use crate::domain::services::sla::SlaStatus;
use crate::domain::services::workflow::{available_actions, TicketAction};
use crate::domain::value_objects::Timestamp;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: String,
    pub title: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub created_by: String,
    pub assignee: Option<String>,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub due_date: Option<Timestamp>,
    pub tags: Vec<String>,
    pub linked: Vec<String>,
    pub actions: Vec<TicketAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla: Option<String>,
}

impl TicketView {
    pub fn for_viewer(ticket: &Ticket, role: Role, now: Timestamp, sla: &SlaSettings) -> Self {
        let details = can_view_workflow_details(role);
        Self {
            id: ticket.id().to_string(),
            title: ticket.title().to_string(),
            category: ticket.category().to_string(),
            priority: ticket.priority().to_string(),
            status: ticket.status().to_string(),
            created_by: ticket.created_by().name.clone(),
            assignee: ticket.assignee().map(|a| a.name.clone()),
            created: ticket.created(),
            updated: ticket.updated(),
            due_date: ticket.due_date(),
            tags: ticket.tags().to_vec(),
            linked: ticket
                .linked_tickets()
                .iter()
                .map(|l| format!("{} ({})", l.id, l.relationship))
                .collect(),
            actions: available_actions(ticket, role),
            escalation_level: details.then(|| ticket.escalation_level().value()),
            sla: details.then(|| SlaStatus::for_ticket(ticket, now, sla).to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub total_tickets: usize,
    pub finished_tickets: usize,
    pub compliance_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::fixtures::*;
    use crate::domain::aggregates::TicketPriority;

    #[test]
    fn test_end_users_do_not_see_escalation_details() {
        let t = ticket("T-1", TicketPriority::Urgent);
        let sla = SlaSettings::default();

        let for_user = TicketView::for_viewer(&t, Role::User, t0(), &sla);
        assert_eq!(for_user.escalation_level, None);
        assert_eq!(for_user.sla, None);
        let json = serde_json::to_value(&for_user).unwrap();
        assert!(json.get("escalationLevel").is_none());

        let for_leader = TicketView::for_viewer(&t, Role::TeamLeader, t0(), &sla);
        assert_eq!(for_leader.escalation_level, Some(0));
        assert_eq!(for_leader.sla.as_deref(), Some("Healthy: 24h left"));
    }
}
