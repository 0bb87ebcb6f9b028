//! Command handlers
//!
//! Application services that orchestrate use cases.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::dto::ComplianceReport;
use crate::application::notifications::NotificationDispatcher;
use crate::config::OrganizationConfig;
use crate::domain::aggregates::{AssigneeSnapshot, NewTicket, Relationship, Ticket, TicketStatus, User};
use crate::domain::events::{TicketEscalation, TicketEvent};
use crate::domain::services::escalation::{self, EscalationRequest};
use crate::domain::services::sla::{self, SlaStatus};
use crate::domain::services::{permissions, tagging, workflow};
use crate::domain::value_objects::{TicketId, Timestamp};
use crate::domain::TicketError;
use crate::ports::inbound::{TicketUseCases, UseCaseError};
use crate::ports::outbound::{
    Clock, EventPublisher, Notification, NotificationSink, TeamDirectory, TicketRepository,
};

/// Ticket application service
pub struct TicketService {
    ticket_repo: Arc<dyn TicketRepository>,
    directory: Arc<dyn TeamDirectory>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    config: Arc<OrganizationConfig>,
    dispatcher: NotificationDispatcher,
}

impl TicketService {
    pub fn new(
        ticket_repo: Arc<dyn TicketRepository>,
        directory: Arc<dyn TeamDirectory>,
        sink: Arc<dyn NotificationSink>,
        event_publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: Arc<OrganizationConfig>,
    ) -> Self {
        Self {
            ticket_repo,
            directory,
            event_publisher,
            clock,
            dispatcher: NotificationDispatcher::new(sink, config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &OrganizationConfig {
        &self.config
    }

    async fn load(&self, id: &TicketId) -> Result<Ticket, UseCaseError> {
        self.ticket_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| TicketError::TicketNotFound(id.clone()).into())
    }

    /// Apply an escalation request, store the ticket and notify. Once stored,
    /// the escalation is returned even when publishing its event fails.
    async fn apply_escalation(
        &self,
        ticket: &Ticket,
        request: EscalationRequest,
        now: Timestamp,
    ) -> Result<TicketEscalation, UseCaseError> {
        let outcome = escalation::escalate(ticket, request, self.directory.as_ref(), now)?;
        self.ticket_repo.save(&outcome.ticket).await?;
        self.dispatcher.escalated(&outcome.ticket, &outcome.escalation);

        tracing::info!(
            ticket_id = %outcome.ticket.id(),
            level = outcome.escalation.level.value(),
            escalated_to = %outcome.escalation.escalated_to.id,
            reason = %outcome.escalation.reason,
            "ticket escalated"
        );

        // Stored escalations are always reported; a publish failure is only logged.
        if let Err(e) = self
            .event_publisher
            .publish(vec![TicketEvent::Escalated(outcome.escalation.clone())])
            .await
        {
            tracing::error!(ticket_id = %outcome.ticket.id(), error = %e, "failed to publish escalation event");
        }
        Ok(outcome.escalation)
    }
}

#[async_trait]
impl TicketUseCases for TicketService {
    async fn create_ticket(&self, new: NewTicket) -> Result<Ticket, UseCaseError> {
        let now = self.clock.now();
        let ticket = Ticket::create(new, now, &self.config.sla);

        self.ticket_repo.save(&ticket).await?;
        self.dispatcher.ticket_created(&ticket);

        tracing::info!(
            ticket_id = %ticket.id(),
            priority = %ticket.priority(),
            category = %ticket.category(),
            "ticket created"
        );

        self.event_publisher
            .publish(vec![TicketEvent::Created {
                ticket_id: ticket.id().clone(),
                created_by: ticket.created_by().id.clone(),
                at: now,
            }])
            .await?;
        Ok(ticket)
    }

    async fn get_ticket(&self, id: &TicketId, viewer: &User) -> Result<Ticket, UseCaseError> {
        let ticket = self.load(id).await?;
        if !permissions::can_view_ticket(Some(viewer), &ticket) {
            tracing::debug!(ticket_id = %id, user_id = %viewer.id, "ticket hidden from viewer");
            return Err(TicketError::permission_denied("You don't have permission to view this ticket").into());
        }
        Ok(ticket)
    }

    async fn list_tickets(&self, viewer: &User) -> Result<Vec<Ticket>, UseCaseError> {
        let mut tickets: Vec<Ticket> = self
            .ticket_repo
            .find_all()
            .await?
            .into_iter()
            .filter(|t| permissions::can_view_ticket(Some(viewer), t))
            .collect();
        tickets.sort_by(|a, b| b.created().cmp(&a.created()));
        Ok(tickets)
    }

    async fn update_status(&self, id: &TicketId, status: TicketStatus, actor: &User) -> Result<Ticket, UseCaseError> {
        let old = self.load(id).await?;
        let new = workflow::update_ticket_status(&old, status, Some(actor), self.clock.now())?;

        self.ticket_repo.save(&new).await?;
        self.dispatcher.ticket_changed(&old, &new, Some(actor));

        tracing::info!(
            ticket_id = %id,
            from = %old.status(),
            to = %new.status(),
            actor = %actor.id,
            "ticket status updated"
        );

        self.event_publisher
            .publish(vec![TicketEvent::StatusChanged {
                ticket_id: id.clone(),
                from: old.status(),
                to: new.status(),
                actor: Some(actor.id.clone()),
                at: new.updated(),
            }])
            .await?;
        Ok(new)
    }

    async fn assign(&self, id: &TicketId, assignee: &User, actor: &User) -> Result<Ticket, UseCaseError> {
        if !actor.role.is_staff() {
            return Err(TicketError::permission_denied("You don't have permission to assign this ticket").into());
        }
        let old = self.load(id).await?;
        let new = old.assign(AssigneeSnapshot::from(assignee), self.clock.now());

        self.ticket_repo.save(&new).await?;
        self.dispatcher.ticket_changed(&old, &new, Some(actor));

        tracing::info!(ticket_id = %id, assignee = %assignee.id, actor = %actor.id, "ticket assigned");

        self.event_publisher
            .publish(vec![TicketEvent::Assigned {
                ticket_id: id.clone(),
                assignee: assignee.id.clone(),
                at: new.updated(),
            }])
            .await?;
        Ok(new)
    }

    async fn add_tag(&self, id: &TicketId, tag: &str) -> Result<Ticket, UseCaseError> {
        let old = self.load(id).await?;
        let new = tagging::add_tag(&old, tag, self.clock.now());
        if new == old {
            return Ok(new);
        }
        self.ticket_repo.save(&new).await?;
        self.event_publisher
            .publish(vec![TicketEvent::Tagged { ticket_id: id.clone(), tag: tagging::normalize_tag(tag) }])
            .await?;
        Ok(new)
    }

    async fn remove_tag(&self, id: &TicketId, tag: &str) -> Result<Ticket, UseCaseError> {
        let old = self.load(id).await?;
        let new = tagging::remove_tag(&old, tag, self.clock.now());
        if new == old {
            return Ok(new);
        }
        self.ticket_repo.save(&new).await?;
        self.event_publisher
            .publish(vec![TicketEvent::Untagged { ticket_id: id.clone(), tag: tagging::normalize_tag(tag) }])
            .await?;
        Ok(new)
    }

    async fn link(
        &self,
        id: &TicketId,
        target_id: &TicketId,
        relationship: Relationship,
    ) -> Result<(Ticket, Ticket), UseCaseError> {
        let source = self.load(id).await?;
        let candidates: Vec<Ticket> = self.ticket_repo.find_by_id(target_id).await?.into_iter().collect();
        let (source, target) = tagging::link_tickets(&source, target_id, relationship, &candidates, self.clock.now())?;

        self.ticket_repo.save_all(&[source.clone(), target.clone()]).await?;

        tracing::info!(ticket_id = %id, target_id = %target_id, relationship = %relationship, "tickets linked");

        self.event_publisher
            .publish(vec![TicketEvent::Linked { ticket_id: id.clone(), target_id: target_id.clone(), relationship }])
            .await?;
        Ok((source, target))
    }

    async fn unlink(&self, id: &TicketId, target_id: &TicketId) -> Result<(Ticket, Option<Ticket>), UseCaseError> {
        let source = self.load(id).await?;
        let candidates: Vec<Ticket> = self.ticket_repo.find_by_id(target_id).await?.into_iter().collect();
        let (next_source, next_target) = tagging::unlink_tickets(&source, target_id, &candidates, self.clock.now());

        let mut changed = Vec::with_capacity(2);
        if next_source != source {
            changed.push(next_source.clone());
        }
        if let Some(target) = next_target.as_ref().filter(|t| !candidates.contains(t)) {
            changed.push(target.clone());
        }
        if changed.is_empty() {
            return Ok((next_source, next_target));
        }
        self.ticket_repo.save_all(&changed).await?;

        tracing::info!(ticket_id = %id, target_id = %target_id, "tickets unlinked");

        self.event_publisher
            .publish(vec![TicketEvent::Unlinked { ticket_id: id.clone(), target_id: target_id.clone() }])
            .await?;
        Ok((next_source, next_target))
    }

    async fn escalate(&self, id: &TicketId, reason: &str, actor: &User) -> Result<TicketEscalation, UseCaseError> {
        let ticket = self.load(id).await?;
        let level = ticket.escalation_level().next().ok_or_else(|| TicketError::EscalationRejected {
            reason: format!("ticket {} is already at the highest escalation level", id),
        })?;
        let request = EscalationRequest::manual(level, reason, actor.clone());
        self.apply_escalation(&ticket, request, self.clock.now()).await
    }

    async fn run_escalation_check(&self) -> Result<Vec<TicketEscalation>, UseCaseError> {
        let now = self.clock.now();
        let tickets = self.ticket_repo.find_all().await?;
        let mut fired = Vec::new();

        for ticket in &tickets {
            let Some(decision) =
                escalation::check_escalation(ticket, now, self.directory.as_ref(), &self.config.escalation)
            else {
                continue;
            };
            match self.apply_escalation(ticket, EscalationRequest::from_decision(&decision), now).await {
                Ok(escalation) => fired.push(escalation),
                Err(e) => tracing::error!(ticket_id = %ticket.id(), error = %e, "failed to apply escalation"),
            }
        }

        tracing::debug!(checked = tickets.len(), escalated = fired.len(), "escalation check finished");
        Ok(fired)
    }

    async fn compliance_report(&self) -> Result<ComplianceReport, UseCaseError> {
        let tickets = self.ticket_repo.find_all().await?;
        Ok(ComplianceReport {
            total_tickets: tickets.len(),
            finished_tickets: tickets.iter().filter(|t| t.is_finished()).count(),
            compliance_rate: sla::compliance_rate(&tickets),
        })
    }

    async fn sla_report(&self) -> Result<Vec<(Ticket, SlaStatus)>, UseCaseError> {
        let now = self.clock.now();
        let mut report: Vec<(Ticket, SlaStatus)> = self
            .ticket_repo
            .find_all()
            .await?
            .into_iter()
            .filter(|t| !t.is_finished())
            .map(|t| {
                let status = SlaStatus::for_ticket(&t, now, &self.config.sla);
                (t, status)
            })
            .collect();
        report.sort_by_key(|(t, _)| t.due_date());
        Ok(report)
    }

    async fn sla_alerts(&self, viewer: &User) -> Result<Vec<Notification>, UseCaseError> {
        let visible = self.list_tickets(viewer).await?;
        Ok(self.dispatcher.sla_alerts(&visible, viewer, self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::fixtures::{creator, t0};
    use crate::domain::aggregates::{EscalationLevel, Role, TicketPriority};
    use crate::domain::value_objects::TeamId;
    use crate::ports::outbound::RepositoryError;
    use crate::infrastructure::{
        InMemoryEventLog, InMemoryNotificationSink, InMemoryTicketRepository, ManualClock, StaticDirectory,
    };
    use chrono::Duration;

    struct Harness {
        service: TicketService,
        repo: Arc<InMemoryTicketRepository>,
        sink: Arc<InMemoryNotificationSink>,
        events: Arc<InMemoryEventLog>,
        clock: Arc<ManualClock>,
    }

    fn staff() -> StaticDirectory {
        StaticDirectory::new(vec![
            User::new("1", "Admin", "admin@example.com", Role::Admin),
            User::new("2", "Agent", "agent@example.com", Role::Agent).in_team("team-1"),
            User::new("3", "Regular User", "user@example.com", Role::User).in_team("team-1"),
            User::new("4", "Team Leader", "leader@example.com", Role::TeamLeader).in_team("team-1"),
            User::new("5", "Manager", "manager@example.com", Role::Manager),
        ])
        .with_team_leader(TeamId::from("team-1"), "4".into())
    }

    fn harness(directory: StaticDirectory) -> Harness {
        let repo = Arc::new(InMemoryTicketRepository::new());
        let sink = Arc::new(InMemoryNotificationSink::new());
        let events = Arc::new(InMemoryEventLog::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let service = TicketService::new(
            repo.clone(),
            Arc::new(directory),
            sink.clone(),
            events.clone(),
            clock.clone(),
            Arc::new(OrganizationConfig::default()),
        );
        Harness { service, repo, sink, events, clock }
    }

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _events: Vec<TicketEvent>) -> Result<(), RepositoryError> {
            Err(RepositoryError::Io("event bus unavailable".into()))
        }
    }

    fn new_ticket(id: &str, priority: TicketPriority) -> NewTicket {
        let mut new = NewTicket::new("VPN down", "Cannot connect", "technical", priority, creator("3", Some(Role::User)));
        new.id = Some(TicketId::from(id));
        new
    }

    fn user(id: &str, role: Role) -> User {
        let user = User::new(id, format!("User {}", id), format!("{}@example.com", id), role);
        user.in_team("team-1")
    }

    #[tokio::test]
    async fn test_create_then_work_through_statuses() {
        let h = harness(staff());
        let t = h.service.create_ticket(new_ticket("T-1", TicketPriority::High)).await.unwrap();
        assert_eq!(t.due_date(), Some(t0() + Duration::days(2)));

        h.clock.advance(Duration::minutes(5));
        let agent = user("2", Role::Agent);
        let t = h.service.update_status(&"T-1".into(), TicketStatus::InProgress, &agent).await.unwrap();
        assert_eq!(t.status(), TicketStatus::InProgress);

        let stored = h.repo.find_by_id(&"T-1".into()).await.unwrap().unwrap();
        assert_eq!(stored, t);
        assert_eq!(h.sink.for_user(&"3".into())[0].title, "Ticket Status Updated");

        let types: Vec<&str> = h.events.events().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["ticket.created", "ticket.status_changed"]);
    }

    #[tokio::test]
    async fn test_denied_transition_leaves_store_untouched() {
        let h = harness(staff());
        h.service.create_ticket(new_ticket("T-1", TicketPriority::High)).await.unwrap();

        let err = h
            .service
            .update_status(&"T-1".into(), TicketStatus::Closed, &user("2", Role::Agent))
            .await
            .unwrap_err();
        assert!(err.is_denial());
        assert_eq!(err.to_string(), crate::domain::STATUS_PERMISSION_DENIED);

        let stored = h.repo.find_by_id(&"T-1".into()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TicketStatus::Open);
        assert_eq!(h.events.events().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_ticket_is_not_found() {
        let h = harness(staff());
        let err = h.service.add_tag(&"T-404".into(), "vpn").await.unwrap_err();
        assert_eq!(err, UseCaseError::Ticket(TicketError::TicketNotFound("T-404".into())));
    }

    #[tokio::test]
    async fn test_visibility_filters_listing() {
        let h = harness(staff());
        h.service.create_ticket(new_ticket("T-1", TicketPriority::Low)).await.unwrap();

        assert_eq!(h.service.list_tickets(&user("3", Role::User)).await.unwrap().len(), 1);
        assert!(h.service.list_tickets(&user("8", Role::User)).await.unwrap().is_empty());
        assert!(h.service.list_tickets(&user("2", Role::Agent)).await.unwrap().is_empty());

        let err = h.service.get_ticket(&"T-1".into(), &user("8", Role::User)).await.unwrap_err();
        assert!(err.is_denial());
    }

    #[tokio::test]
    async fn test_assign_notifies_assignee() {
        let h = harness(staff());
        h.service.create_ticket(new_ticket("T-1", TicketPriority::Low)).await.unwrap();
        let agent = user("2", Role::Agent);

        let t = h.service.assign(&"T-1".into(), &agent, &user("4", Role::TeamLeader)).await.unwrap();
        assert_eq!(t.assignee().unwrap().id.as_str(), "2");
        assert_eq!(h.sink.for_user(&"2".into())[0].title, "New Ticket Assigned");

        let err = h.service.assign(&"T-1".into(), &agent, &user("3", Role::User)).await.unwrap_err();
        assert!(err.is_denial());
    }

    #[tokio::test]
    async fn test_link_and_unlink_persist_both_sides() {
        let h = harness(staff());
        h.service.create_ticket(new_ticket("T-A", TicketPriority::Low)).await.unwrap();
        h.service.create_ticket(new_ticket("T-B", TicketPriority::Low)).await.unwrap();

        h.service.link(&"T-A".into(), &"T-B".into(), Relationship::Child).await.unwrap();
        let b = h.repo.find_by_id(&"T-B".into()).await.unwrap().unwrap();
        assert_eq!(b.link_to(&"T-A".into()).unwrap().relationship, Relationship::Parent);

        let err = h.service.link(&"T-A".into(), &"T-404".into(), Relationship::Related).await.unwrap_err();
        assert_eq!(err, UseCaseError::Ticket(TicketError::TicketNotFound("T-404".into())));

        h.service.unlink(&"T-A".into(), &"T-B".into()).await.unwrap();
        let a = h.repo.find_by_id(&"T-A".into()).await.unwrap().unwrap();
        let b = h.repo.find_by_id(&"T-B".into()).await.unwrap().unwrap();
        assert!(a.linked_tickets().is_empty());
        assert!(b.linked_tickets().is_empty());
    }

    #[tokio::test]
    async fn test_tag_round_trip_skips_noops() {
        let h = harness(staff());
        h.service.create_ticket(new_ticket("T-1", TicketPriority::Low)).await.unwrap();
        h.service.add_tag(&"T-1".into(), " Network ").await.unwrap();
        h.service.add_tag(&"T-1".into(), "network").await.unwrap();
        h.service.remove_tag(&"T-1".into(), "printer").await.unwrap();

        let t = h.repo.find_by_id(&"T-1".into()).await.unwrap().unwrap();
        assert_eq!(t.tags(), &["network".to_string()]);
        let types: Vec<&str> = h.events.events().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["ticket.created", "ticket.tagged"]);
    }

    #[tokio::test]
    async fn test_escalation_tick_fires_once_per_level() {
        let h = harness(staff());
        h.service.create_ticket(new_ticket("T-1", TicketPriority::Urgent)).await.unwrap();

        h.clock.set(t0() + Duration::hours(25));
        let fired = h.service.run_escalation_check().await.unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].level, EscalationLevel::TeamLeader);
        assert_eq!(fired[0].reason, "SLA breach");
        assert!(h.service.run_escalation_check().await.unwrap().is_empty());

        let leader_notes = h.sink.for_user(&"4".into());
        assert_eq!(leader_notes[0].title, "Ticket Escalated");
        let creator_notes = h.sink.for_user(&"3".into());
        assert_eq!(creator_notes[0].title, "Your Ticket Has Been Updated");

        h.clock.set(t0() + Duration::hours(49));
        let fired = h.service.run_escalation_check().await.unwrap();
        assert_eq!(fired[0].level, EscalationLevel::Manager);
        assert_eq!(fired[0].escalated_to.id.as_str(), "5");

        h.clock.set(t0() + Duration::days(30));
        assert!(h.service.run_escalation_check().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_escalation_skipped_without_team_leader() {
        let h = harness(StaticDirectory::new(vec![]));
        h.service.create_ticket(new_ticket("T-1", TicketPriority::Urgent)).await.unwrap();
        h.clock.set(t0() + Duration::hours(25));
        assert!(h.service.run_escalation_check().await.unwrap().is_empty());
        let t = h.repo.find_by_id(&"T-1".into()).await.unwrap().unwrap();
        assert_eq!(t.escalation_level(), EscalationLevel::None);
    }

    #[tokio::test]
    async fn test_stored_escalation_is_reported_when_publish_fails() {
        let repo = Arc::new(InMemoryTicketRepository::new());
        let sink = Arc::new(InMemoryNotificationSink::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let urgent = new_ticket("T-1", TicketPriority::Urgent);
        repo.save(&Ticket::create(urgent, t0(), &OrganizationConfig::default().sla)).await.unwrap();

        let service = TicketService::new(
            repo.clone(),
            Arc::new(staff()),
            sink.clone(),
            Arc::new(FailingPublisher),
            clock.clone(),
            Arc::new(OrganizationConfig::default()),
        );

        clock.set(t0() + Duration::hours(25));
        let fired = service.run_escalation_check().await.unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].level, EscalationLevel::TeamLeader);

        let stored = repo.find_by_id(&"T-1".into()).await.unwrap().unwrap();
        assert_eq!(stored.escalation_level(), EscalationLevel::TeamLeader);
        assert_eq!(sink.for_user(&"4".into())[0].title, "Ticket Escalated");
        assert!(service.run_escalation_check().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_escalation_uses_the_same_guard() {
        let h = harness(staff());
        h.service.create_ticket(new_ticket("T-1", TicketPriority::Low)).await.unwrap();

        let err = h.service.escalate(&"T-1".into(), "angry customer", &user("2", Role::Agent)).await.unwrap_err();
        assert!(err.is_denial());

        let leader = user("4", Role::TeamLeader);
        let first = h.service.escalate(&"T-1".into(), "angry customer", &leader).await.unwrap();
        assert_eq!(first.level, EscalationLevel::TeamLeader);
        let second = h.service.escalate(&"T-1".into(), "still angry", &leader).await.unwrap();
        assert_eq!(second.level, EscalationLevel::Manager);
        let err = h.service.escalate(&"T-1".into(), "again", &leader).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Ticket(TicketError::EscalationRejected { .. })));
    }

    #[tokio::test]
    async fn test_compliance_and_sla_report() {
        let h = harness(staff());
        assert_eq!(h.service.compliance_report().await.unwrap().compliance_rate, 100.0);

        h.service.create_ticket(new_ticket("T-1", TicketPriority::Urgent)).await.unwrap();
        h.service.create_ticket(new_ticket("T-2", TicketPriority::Low)).await.unwrap();
        let admin = user("1", Role::Admin);

        h.clock.set(t0() + Duration::hours(2));
        h.service.update_status(&"T-2".into(), TicketStatus::Resolved, &admin).await.unwrap();
        h.clock.set(t0() + Duration::hours(30));
        h.service.update_status(&"T-1".into(), TicketStatus::Resolved, &admin).await.unwrap();
        let report = h.service.compliance_report().await.unwrap();
        assert_eq!(report.finished_tickets, 2);
        assert_eq!(report.compliance_rate, 50.0);

        h.service.create_ticket(new_ticket("T-3", TicketPriority::Urgent)).await.unwrap();
        h.clock.set(t0() + Duration::hours(30) + Duration::hours(23) + Duration::minutes(30));
        let report = h.service.sla_report().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].1, SlaStatus::Critical { minutes_left: 30 });

        let alerts = h.service.sla_alerts(&admin).await.unwrap();
        assert_eq!(alerts.len(), 1);
    }
}
