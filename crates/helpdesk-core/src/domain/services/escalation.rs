//! Escalation Engine
//!
//! Two timed tiers: team leader, then the first manager. [`check_escalation`]
//! only decides; [`escalate`] is the one place that raises
//! `escalation_level`, for both the periodic checker and manual requests.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::config::{EscalationSettings, StaleTimerBasis};
use crate::domain::aggregates::{EscalationLevel, EscalationTarget, Ticket, TicketStatus, User};
use crate::domain::events::TicketEscalation;
use crate::domain::value_objects::{TicketId, Timestamp};
use crate::domain::TicketError;
use crate::ports::outbound::TeamDirectory;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum EscalationTrigger {
    /// Tier 1: past the due date
    SlaBreach,
    /// Tier 1: still open long after creation
    StaleOpen { days: i64 },
    /// Tier 2: past the due date plus the grace period
    ContinuedSlaBreach,
    /// Tier 2: unresolved long after the tier-1 escalation
    StaleAfterEscalation { days: i64 },
    /// Operator-forced escalation with free-text reason
    Manual { reason: String },
}

impl EscalationTrigger {
    pub fn reason(&self) -> String {
        match self {
            Self::SlaBreach => "SLA breach".to_string(),
            Self::StaleOpen { days } => format!("No status change for {} days", days),
            Self::ContinuedSlaBreach => "Continued SLA breach after Team Leader escalation".to_string(),
            Self::StaleAfterEscalation { days } => {
                format!("No resolution {} days after Team Leader escalation", days)
            }
            Self::Manual { reason } => reason.clone(),
        }
    }
}

/// What the checker wants to happen to one ticket at one instant
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscalationDecision {
    pub ticket_id: TicketId,
    pub level: EscalationLevel,
    pub trigger: EscalationTrigger,
    pub target: EscalationTarget,
}

impl EscalationDecision {
    pub fn reason(&self) -> String {
        self.trigger.reason()
    }
}

/// Input of [`escalate`]. `actor` is `None` for the unattended checker.
#[derive(Clone, Debug)]
pub struct EscalationRequest {
    pub level: EscalationLevel,
    pub reason: String,
    pub actor: Option<User>,
    /// Pre-resolved target; looked up in the directory when absent
    pub target: Option<EscalationTarget>,
}

impl EscalationRequest {
    pub fn manual(level: EscalationLevel, reason: impl Into<String>, actor: User) -> Self {
        Self { level, reason: reason.into(), actor: Some(actor), target: None }
    }

    pub fn from_decision(decision: &EscalationDecision) -> Self {
        Self {
            level: decision.level,
            reason: decision.reason(),
            actor: None,
            target: Some(decision.target.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EscalationOutcome {
    pub ticket: Ticket,
    pub escalation: TicketEscalation,
}

/// Which tier, if any, is due for `ticket` at `now`. Pure: no directory lookups.
pub fn evaluate_trigger(
    ticket: &Ticket,
    now: Timestamp,
    settings: &EscalationSettings,
) -> Option<(EscalationLevel, EscalationTrigger)> {
    if ticket.is_finished() {
        return None;
    }
    let breached_by = |grace_days: i64| {
        ticket
            .due_date()
            .and_then(|due| days_after(due, grace_days))
            .is_some_and(|deadline| now > deadline)
    };
    let stale_since =
        |start: Timestamp, days: i64| days_after(start, days).is_some_and(|limit| now > limit);

    match ticket.escalation_level() {
        EscalationLevel::None => {
            if breached_by(0) {
                Some((EscalationLevel::TeamLeader, EscalationTrigger::SlaBreach))
            } else if ticket.status() == TicketStatus::Open
                && stale_since(ticket.created(), settings.stale_open_days)
            {
                Some((
                    EscalationLevel::TeamLeader,
                    EscalationTrigger::StaleOpen { days: settings.stale_open_days },
                ))
            } else {
                None
            }
        }
        EscalationLevel::TeamLeader => {
            let active = matches!(ticket.status(), TicketStatus::Open | TicketStatus::InProgress);
            if breached_by(settings.tier2_grace_days) {
                Some((EscalationLevel::Manager, EscalationTrigger::ContinuedSlaBreach))
            } else if active
                && stale_since(stale_timer_start(ticket, settings.stale_timer), settings.stale_after_escalation_days)
            {
                Some((
                    EscalationLevel::Manager,
                    EscalationTrigger::StaleAfterEscalation { days: settings.stale_after_escalation_days },
                ))
            } else {
                None
            }
        }
        EscalationLevel::Manager => None,
    }
}

/// `start` plus `days`; an offset past the calendar never arrives
fn days_after(start: Timestamp, days: i64) -> Option<Timestamp> {
    Duration::try_days(days).and_then(|d| start.checked_add_signed(d))
}

fn stale_timer_start(ticket: &Ticket, basis: StaleTimerBasis) -> Timestamp {
    match basis {
        StaleTimerBasis::LastEscalation => ticket.last_escalated_at().unwrap_or_else(|| ticket.updated()),
        StaleTimerBasis::LastUpdate => ticket.updated(),
    }
}

/// Team leader of the ticket's team for tier 1, the first manager for tier 2
pub fn resolve_target(
    ticket: &Ticket,
    level: EscalationLevel,
    directory: &dyn TeamDirectory,
) -> Result<EscalationTarget, TicketError> {
    let user = match level {
        EscalationLevel::TeamLeader => ticket.team_id().and_then(|team| directory.team_leader(team)),
        EscalationLevel::Manager => directory.managers().into_iter().next(),
        EscalationLevel::None => None,
    };
    user.map(|u| EscalationTarget::from(&u))
        .ok_or(TicketError::EscalationTargetMissing { level })
}

/// Periodic escalation decision for one ticket.
///
/// Deterministic in `(ticket, now)` and the directory contents, so repeated
/// calls within a tick agree. A missing target skips the escalation.
pub fn check_escalation(
    ticket: &Ticket,
    now: Timestamp,
    directory: &dyn TeamDirectory,
    settings: &EscalationSettings,
) -> Option<EscalationDecision> {
    let (level, trigger) = evaluate_trigger(ticket, now, settings)?;
    match resolve_target(ticket, level, directory) {
        Ok(target) => Some(EscalationDecision { ticket_id: ticket.id().clone(), level, trigger, target }),
        Err(e) => {
            tracing::warn!(
                ticket_id = %ticket.id(),
                team_id = ticket.team_id().map(|t| t.as_str()).unwrap_or(""),
                level = level.value(),
                reason = %trigger.reason(),
                error = %e,
                "escalation skipped"
            );
            None
        }
    }
}

/// Raise a ticket to the next escalation level.
///
/// Only the next level is accepted (0 to 1, 1 to 2). Finished tickets are
/// refused, and a manual request needs an admin, manager or team leader.
///
/// `updated` becomes `now`, unless the stored value is already at or past
/// `now`; then it moves one millisecond forward so it never goes backwards.
/// `last_escalated_at` is always `now`.
pub fn escalate(
    ticket: &Ticket,
    request: EscalationRequest,
    directory: &dyn TeamDirectory,
    now: Timestamp,
) -> Result<EscalationOutcome, TicketError> {
    if ticket.is_finished() {
        return Err(TicketError::EscalationRejected {
            reason: format!("ticket {} is {}", ticket.id(), ticket.status()),
        });
    }
    if let Some(actor) = &request.actor {
        if !actor.role.is_supervisory() {
            return Err(TicketError::permission_denied("You don't have permission to escalate this ticket"));
        }
    }
    if ticket.escalation_level().next() != Some(request.level) {
        return Err(TicketError::EscalationRejected {
            reason: format!(
                "ticket {} is at level {} and cannot move to level {}",
                ticket.id(),
                ticket.escalation_level(),
                request.level
            ),
        });
    }

    let target = match request.target {
        Some(target) => target,
        None => resolve_target(ticket, request.level, directory)?,
    };

    let mut next = ticket.clone();
    next.escalation_level = request.level;
    next.last_escalated_at = Some(now);
    next.touch(now);

    let escalation = TicketEscalation {
        ticket_id: next.id().clone(),
        level: request.level,
        timestamp: now,
        reason: request.reason,
        escalated_to: target,
    };
    Ok(EscalationOutcome { ticket: next, escalation })
}

#[cfg(test)]
pub(crate) mod test_directory {
    use super::*;
    use crate::domain::aggregates::Role;
    use crate::domain::value_objects::{TeamId, UserId};

    #[derive(Default)]
    pub struct FakeDirectory {
        pub leaders: Vec<(TeamId, User)>,
        pub managers: Vec<User>,
    }

    impl FakeDirectory {
        pub fn staffed() -> Self {
            Self {
                leaders: vec![(
                    TeamId::from("team-1"),
                    User::new("4", "Team Leader", "leader@example.com", Role::TeamLeader).in_team("team-1"),
                )],
                managers: vec![
                    User::new("5", "Manager", "manager@example.com", Role::Manager),
                    User::new("6", "Second Manager", "manager2@example.com", Role::Manager),
                ],
            }
        }
    }

    impl TeamDirectory for FakeDirectory {
        fn team_leader(&self, team_id: &TeamId) -> Option<User> {
            self.leaders.iter().find(|(t, _)| t == team_id).map(|(_, u)| u.clone())
        }

        fn managers(&self) -> Vec<User> {
            self.managers.clone()
        }

        fn find_user(&self, id: &UserId) -> Option<User> {
            self.leaders
                .iter()
                .map(|(_, u)| u)
                .chain(self.managers.iter())
                .find(|u| &u.id == id)
                .cloned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_directory::FakeDirectory;
    use super::*;
    use crate::domain::aggregates::fixtures::*;
    use crate::domain::aggregates::{Role, TicketPriority};
    use proptest::prelude::*;

    fn settings() -> EscalationSettings {
        EscalationSettings::default()
    }

    fn apply(ticket: &Ticket, decision: &EscalationDecision, now: Timestamp) -> Ticket {
        escalate(ticket, EscalationRequest::from_decision(decision), &FakeDirectory::staffed(), now)
            .unwrap()
            .ticket
    }

    #[test]
    fn test_escalation_sets_updated_without_moving_it_backwards() {
        let dir = FakeDirectory::staffed();
        let t = ticket("T-1", TicketPriority::Urgent);
        let now = t0() + Duration::hours(25);
        let decision = check_escalation(&t, now, &dir, &settings()).unwrap();
        assert_eq!(apply(&t, &decision, now).updated(), now);

        let mut ahead = t.clone();
        ahead.updated = now + Duration::minutes(10);
        let escalated = apply(&ahead, &decision, now);
        assert_eq!(escalated.updated(), now + Duration::minutes(10) + Duration::milliseconds(1));
        assert_eq!(escalated.last_escalated_at(), Some(now));
    }

    #[test]
    fn test_out_of_range_settings_never_trigger() {
        let dir = FakeDirectory::staffed();
        let huge = EscalationSettings {
            stale_open_days: i64::MAX,
            tier2_grace_days: i64::MAX,
            stale_after_escalation_days: i64::MAX,
            ..settings()
        };
        let mut t = ticket("T-1", TicketPriority::Urgent);
        t.due_date = None;
        assert_eq!(check_escalation(&t, t0() + Duration::days(365), &dir, &huge), None);

        let t = ticket("T-2", TicketPriority::Urgent);
        let now = t0() + Duration::hours(25);
        let first = check_escalation(&t, now, &dir, &huge).unwrap();
        let t1 = apply(&t, &first, now);
        assert_eq!(check_escalation(&t1, t0() + Duration::days(365), &dir, &huge), None);
    }

    #[test]
    fn test_urgent_ticket_walks_both_tiers() {
        let dir = FakeDirectory::staffed();
        let t = ticket("T-1", TicketPriority::Urgent);

        let first = check_escalation(&t, t0() + Duration::hours(25), &dir, &settings()).unwrap();
        assert_eq!(first.level, EscalationLevel::TeamLeader);
        assert_eq!(first.reason(), "SLA breach");
        assert_eq!(first.target.id.as_str(), "4");

        let t1 = apply(&t, &first, t0() + Duration::hours(25));
        assert_eq!(t1.escalation_level(), EscalationLevel::TeamLeader);
        assert_eq!(t1.last_escalated_at(), Some(t0() + Duration::hours(25)));

        assert_eq!(check_escalation(&t1, t0() + Duration::hours(47), &dir, &settings()), None);

        let second = check_escalation(&t1, t0() + Duration::hours(49), &dir, &settings()).unwrap();
        assert_eq!(second.level, EscalationLevel::Manager);
        assert_eq!(second.reason(), "Continued SLA breach after Team Leader escalation");
        assert_eq!(second.target.id.as_str(), "5");

        let t2 = apply(&t1, &second, t0() + Duration::hours(49));
        assert_eq!(check_escalation(&t2, t0() + Duration::days(30), &dir, &settings()), None);
    }

    #[test]
    fn test_stale_open_only_applies_to_open_tickets() {
        let dir = FakeDirectory::staffed();
        let t = ticket("T-1", TicketPriority::Low);
        let now = t0() + Duration::days(3) + Duration::seconds(1);

        let decision = check_escalation(&t, now, &dir, &settings()).unwrap();
        assert_eq!(decision.reason(), "No status change for 3 days");

        assert_eq!(check_escalation(&t, t0() + Duration::days(3), &dir, &settings()), None);

        let working = with_status(&t, TicketStatus::InProgress);
        assert_eq!(check_escalation(&working, now, &dir, &settings()), None);
    }

    #[test]
    fn test_tier_two_stale_timer_basis() {
        let dir = FakeDirectory::staffed();
        let mut t = ticket("T-1", TicketPriority::Low);
        t.escalation_level = EscalationLevel::TeamLeader;
        t.last_escalated_at = Some(t0() + Duration::hours(1));
        t.updated = t0() + Duration::days(2);
        let now = t0() + Duration::days(4) + Duration::hours(2);

        let decision = check_escalation(&t, now, &dir, &settings()).unwrap();
        assert_eq!(decision.reason(), "No resolution 3 days after Team Leader escalation");

        let by_update = EscalationSettings { stale_timer: StaleTimerBasis::LastUpdate, ..settings() };
        assert_eq!(check_escalation(&t, now, &dir, &by_update), None);

        t.last_escalated_at = None;
        assert_eq!(check_escalation(&t, now, &dir, &settings()), None);
        let later = t0() + Duration::days(5) + Duration::seconds(1);
        assert!(check_escalation(&with_status(&t, TicketStatus::InProgress), later, &dir, &settings()).is_some());
    }

    #[test]
    fn test_missing_targets_skip_escalation() {
        let now = t0() + Duration::hours(25);
        let t = ticket("T-1", TicketPriority::Urgent);
        assert_eq!(check_escalation(&t, now, &FakeDirectory::default(), &settings()), None);

        let mut teamless = t.clone();
        teamless.team_id = None;
        assert_eq!(check_escalation(&teamless, now, &FakeDirectory::staffed(), &settings()), None);

        let mut at_one = t.clone();
        at_one.escalation_level = EscalationLevel::TeamLeader;
        let no_managers = FakeDirectory { managers: vec![], ..FakeDirectory::staffed() };
        assert_eq!(check_escalation(&at_one, t0() + Duration::hours(49), &no_managers, &settings()), None);
        assert_eq!(
            resolve_target(&at_one, EscalationLevel::Manager, &no_managers),
            Err(TicketError::EscalationTargetMissing { level: EscalationLevel::Manager })
        );
    }

    #[test]
    fn test_manual_escalation_guards() {
        let dir = FakeDirectory::staffed();
        let t = ticket("T-1", TicketPriority::Low);
        let leader = User::new("4", "Team Leader", "leader@example.com", Role::TeamLeader);
        let agent = User::new("2", "Agent", "agent@example.com", Role::Agent);

        let skip = escalate(&t, EscalationRequest::manual(EscalationLevel::Manager, "urgent", leader.clone()), &dir, t0());
        assert!(matches!(skip, Err(TicketError::EscalationRejected { .. })));

        let denied = escalate(&t, EscalationRequest::manual(EscalationLevel::TeamLeader, "urgent", agent), &dir, t0());
        assert!(matches!(denied, Err(ref e) if e.is_denial()));

        let closed = with_status(&t, TicketStatus::Closed);
        let refused = escalate(&closed, EscalationRequest::manual(EscalationLevel::TeamLeader, "x", leader.clone()), &dir, t0());
        assert!(matches!(refused, Err(TicketError::EscalationRejected { .. })));

        let now = t0() + Duration::minutes(10);
        let outcome = escalate(&t, EscalationRequest::manual(EscalationLevel::TeamLeader, "customer call", leader), &dir, now).unwrap();
        assert_eq!(t.escalation_level(), EscalationLevel::None);
        assert_eq!(outcome.ticket.escalation_level(), EscalationLevel::TeamLeader);
        assert_eq!(outcome.ticket.updated(), now);
        assert_eq!(outcome.escalation.reason, "customer call");
        assert_eq!(outcome.escalation.escalated_to.role, Role::TeamLeader);
        assert_eq!(outcome.escalation.timestamp, now);
    }

    fn any_status() -> impl Strategy<Value = TicketStatus> {
        prop::sample::select(TicketStatus::ALL.to_vec())
    }

    fn any_priority() -> impl Strategy<Value = TicketPriority> {
        prop::sample::select(vec![TicketPriority::Low, TicketPriority::Medium, TicketPriority::High, TicketPriority::Urgent])
    }

    fn any_level() -> impl Strategy<Value = EscalationLevel> {
        prop::sample::select(vec![EscalationLevel::None, EscalationLevel::TeamLeader, EscalationLevel::Manager])
    }

    proptest! {
        #[test]
        fn prop_check_is_idempotent_per_tick(
            status in any_status(),
            priority in any_priority(),
            level in any_level(),
            minutes in 0i64..20_000,
        ) {
            let dir = FakeDirectory::staffed();
            let mut t = with_status(&ticket("T-1", priority), status);
            t.escalation_level = level;
            let now = t0() + Duration::minutes(minutes);
            let first = check_escalation(&t, now, &dir, &settings());
            let second = check_escalation(&t, now, &dir, &settings());
            prop_assert_eq!(&first, &second);
            if let Some(decision) = first {
                prop_assert_eq!(Some(decision.level), level.next());
            }
        }

        #[test]
        fn prop_finished_tickets_never_escalate(
            finished in prop::sample::select(vec![TicketStatus::Resolved, TicketStatus::Closed]),
            priority in any_priority(),
            level in any_level(),
            minutes in -10_000i64..100_000,
        ) {
            let mut t = with_status(&ticket("T-1", priority), finished);
            t.escalation_level = level;
            let now = t0() + Duration::minutes(minutes);
            prop_assert_eq!(check_escalation(&t, now, &FakeDirectory::staffed(), &settings()), None);
        }
    }
}
