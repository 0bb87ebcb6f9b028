//! Visibility and action permissions

use crate::domain::aggregates::{Role, Ticket, User};

/// Whether `user` may see `ticket`. No user sees nothing.
///
/// Team leaders see their team's tickets only; a ticket or user without a
/// team never matches.
pub fn can_view_ticket(user: Option<&User>, ticket: &Ticket) -> bool {
    let Some(user) = user else {
        return false;
    };
    match user.role {
        Role::Admin | Role::Manager => true,
        Role::TeamLeader => matches!(
            (ticket.team_id(), user.team_id.as_ref()),
            (Some(ticket_team), Some(user_team)) if ticket_team == user_team
        ),
        Role::Agent => ticket.assignee().is_some_and(|a| a.id == user.id),
        Role::User => ticket.created_by().id == user.id,
        Role::Unknown => false,
    }
}

/// Admin, manager, team leader and agent may resolve
pub fn can_resolve_ticket(user: Option<&User>) -> bool {
    user.is_some_and(|u| u.role.is_staff())
}

/// Supervisory roles may cancel any ticket, everyone else only their own
pub fn can_cancel_ticket(user: Option<&User>, ticket: &Ticket) -> bool {
    user.is_some_and(|u| u.role.is_supervisory() || u.id == ticket.created_by().id)
}

/// Manual escalation is reserved for supervisory roles
pub fn can_escalate_ticket(user: Option<&User>) -> bool {
    user.is_some_and(|u| u.role.is_supervisory())
}

/// Escalation level and workflow metadata are shown to supervisors only
pub fn can_view_workflow_details(role: Role) -> bool {
    role.is_supervisory()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::fixtures::*;
    use crate::domain::aggregates::{AssigneeSnapshot, TicketPriority};
    use crate::domain::value_objects::TeamId;

    fn user(id: &str, role: Role) -> User {
        User::new(id, format!("User {}", id), format!("{}@example.com", id), role)
    }

    #[test]
    fn test_no_user_sees_and_does_nothing() {
        let t = ticket("T-1", TicketPriority::Low);
        assert!(!can_view_ticket(None, &t));
        assert!(!can_resolve_ticket(None));
        assert!(!can_cancel_ticket(None, &t));
        assert!(!can_escalate_ticket(None));
    }

    #[test]
    fn test_visibility_by_role() {
        let t = ticket("T-1", TicketPriority::Low)
            .assign(AssigneeSnapshot { id: "2".into(), name: "Agent".into(), role: Some(Role::Agent) }, t0());

        assert!(can_view_ticket(Some(&user("1", Role::Admin)), &t));
        assert!(can_view_ticket(Some(&user("5", Role::Manager)), &t));
        assert!(can_view_ticket(Some(&user("4", Role::TeamLeader).in_team("team-1")), &t));
        assert!(!can_view_ticket(Some(&user("4", Role::TeamLeader).in_team("team-2")), &t));
        assert!(!can_view_ticket(Some(&user("4", Role::TeamLeader)), &t));
        assert!(can_view_ticket(Some(&user("2", Role::Agent)), &t));
        assert!(!can_view_ticket(Some(&user("7", Role::Agent)), &t));
        assert!(can_view_ticket(Some(&user("3", Role::User)), &t));
        assert!(!can_view_ticket(Some(&user("8", Role::User)), &t));
        assert!(!can_view_ticket(Some(&user("1", Role::Unknown)), &t));
    }

    #[test]
    fn test_team_leader_without_ticket_team_sees_nothing() {
        let mut t = ticket("T-1", TicketPriority::Low);
        t.team_id = None;
        let mut leader = user("4", Role::TeamLeader);
        leader.team_id = None::<TeamId>;
        assert!(!can_view_ticket(Some(&leader), &t));
    }

    #[test]
    fn test_resolve_and_cancel() {
        let t = ticket("T-1", TicketPriority::Low);
        assert!(can_resolve_ticket(Some(&user("2", Role::Agent))));
        assert!(!can_resolve_ticket(Some(&user("3", Role::User))));

        assert!(can_cancel_ticket(Some(&user("3", Role::User)), &t));
        assert!(!can_cancel_ticket(Some(&user("9", Role::User)), &t));
        assert!(!can_cancel_ticket(Some(&user("2", Role::Agent)), &t));
        assert!(can_cancel_ticket(Some(&user("4", Role::TeamLeader)), &t));
    }
}
