//! SLA computation
//!
//! Due dates, time to breach, status classification and compliance.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{OrganizationConfig, SlaSettings};
use crate::domain::aggregates::Ticket;
use crate::domain::value_objects::Timestamp;

/// Deadline for a category-driven SLA; `None` past the calendar's range
pub fn due_date_for_category(
    created: Timestamp,
    category_id: &str,
    config: &OrganizationConfig,
) -> Option<Timestamp> {
    Duration::try_hours(i64::from(config.sla_hours_for_category(category_id)))
        .and_then(|d| created.checked_add_signed(d))
}

/// Time left until the deadline; `None` when the ticket has no deadline.
/// A negative duration means the SLA is already breached.
pub fn time_until_sla_breach(ticket: &Ticket, now: Timestamp) -> Option<Duration> {
    ticket.due_date().map(|due| due - now)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlaStatus {
    NoDeadline,
    Breached,
    Critical { minutes_left: i64 },
    AtRisk { hours_left: i64 },
    Healthy { hours_left: i64 },
}

impl SlaStatus {
    pub fn classify(remaining: Option<Duration>, settings: &SlaSettings) -> Self {
        let Some(remaining) = remaining else {
            return Self::NoDeadline;
        };
        if remaining <= Duration::zero() {
            return Self::Breached;
        }
        if settings.critical_window().is_some_and(|window| remaining < window) {
            return Self::Critical { minutes_left: remaining.num_minutes() };
        }
        let hours_left = remaining.num_hours();
        if settings.at_risk_window().is_some_and(|window| remaining < window) {
            Self::AtRisk { hours_left }
        } else {
            Self::Healthy { hours_left }
        }
    }

    pub fn for_ticket(ticket: &Ticket, now: Timestamp, settings: &SlaSettings) -> Self {
        Self::classify(time_until_sla_breach(ticket, now), settings)
    }

    pub fn is_breached(&self) -> bool {
        matches!(self, Self::Breached)
    }

    /// Breached, critical or at risk
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::Breached | Self::Critical { .. } | Self::AtRisk { .. })
    }
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDeadline => f.write_str("No SLA"),
            Self::Breached => f.write_str("Breached"),
            Self::Critical { minutes_left } => write!(f, "Critical: {}m left", minutes_left),
            Self::AtRisk { hours_left } => write!(f, "At Risk: {}h left", hours_left),
            Self::Healthy { hours_left } => write!(f, "Healthy: {}h left", hours_left),
        }
    }
}

/// Percentage of finished tickets whose last update is on or before the
/// deadline. Tickets without a deadline count as compliant; no finished
/// tickets at all is 100.
pub fn compliance_rate(tickets: &[Ticket]) -> f64 {
    let finished: Vec<&Ticket> = tickets.iter().filter(|t| t.is_finished()).collect();
    if finished.is_empty() {
        return 100.0;
    }
    let compliant = finished
        .iter()
        .filter(|t| t.due_date().map_or(true, |due| t.updated() <= due))
        .count();
    compliant as f64 / finished.len() as f64 * 100.0
}

/// Active tickets whose deadline is still ahead but no further than `window`
pub fn tickets_nearing_breach(tickets: &[Ticket], now: Timestamp, window: Duration) -> Vec<(&Ticket, Duration)> {
    tickets
        .iter()
        .filter(|t| !t.is_finished())
        .filter_map(|t| time_until_sla_breach(t, now).map(|left| (t, left)))
        .filter(|(_, left)| *left > Duration::zero() && *left <= window)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::fixtures::*;
    use crate::domain::aggregates::{TicketPriority, TicketStatus};

    fn status_at(remaining: Duration) -> SlaStatus {
        SlaStatus::classify(Some(remaining), &SlaSettings::default())
    }

    #[test]
    fn test_no_deadline_is_unbounded() {
        let mut t = ticket("T-1", TicketPriority::Low);
        t.due_date = None;
        assert_eq!(time_until_sla_breach(&t, t0() + Duration::days(400)), None);
        assert_eq!(SlaStatus::for_ticket(&t, t0(), &SlaSettings::default()), SlaStatus::NoDeadline);
    }

    #[test]
    fn test_status_text_thresholds() {
        assert_eq!(status_at(Duration::zero()).to_string(), "Breached");
        assert_eq!(status_at(Duration::minutes(-5)).to_string(), "Breached");
        assert_eq!(status_at(Duration::minutes(12) + Duration::seconds(40)).to_string(), "Critical: 12m left");
        assert_eq!(status_at(Duration::minutes(60)).to_string(), "At Risk: 1h left");
        assert_eq!(status_at(Duration::minutes(239)).to_string(), "At Risk: 3h left");
        assert_eq!(status_at(Duration::hours(4)).to_string(), "Healthy: 4h left");
        assert_eq!(status_at(Duration::hours(20) + Duration::minutes(59)).to_string(), "Healthy: 20h left");
    }

    #[test]
    fn test_compliance_empty_and_boundary() {
        assert_eq!(compliance_rate(&[]), 100.0);

        let open_only = vec![ticket("T-1", TicketPriority::Low)];
        assert_eq!(compliance_rate(&open_only), 100.0);

        let mut on_time = with_status(&ticket("T-2", TicketPriority::Urgent), TicketStatus::Resolved);
        on_time.updated = on_time.due_date().unwrap();
        let mut late = with_status(&ticket("T-3", TicketPriority::Urgent), TicketStatus::Closed);
        late.updated = late.due_date().unwrap() + Duration::seconds(1);
        let mut no_deadline = with_status(&ticket("T-4", TicketPriority::Urgent), TicketStatus::Closed);
        no_deadline.due_date = None;

        assert_eq!(compliance_rate(&[on_time.clone()]), 100.0);
        assert_eq!(compliance_rate(&[on_time.clone(), late.clone()]), 50.0);
        let rate = compliance_rate(&[on_time, late, no_deadline]);
        assert!((rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_due_date() {
        let config = OrganizationConfig::default();
        assert_eq!(due_date_for_category(t0(), "account", &config), Some(t0() + Duration::hours(12)));
        assert_eq!(due_date_for_category(t0(), "unknown", &config), Some(t0() + Duration::hours(24)));
    }

    #[test]
    fn test_nearing_breach_window() {
        let urgent = ticket("T-1", TicketPriority::Urgent);
        let finished = with_status(&ticket("T-2", TicketPriority::Urgent), TicketStatus::Resolved);
        let low = ticket("T-3", TicketPriority::Low);
        let tickets = vec![urgent, finished, low];

        let now = t0() + Duration::hours(23) + Duration::minutes(30);
        let near = tickets_nearing_breach(&tickets, now, Duration::hours(1));
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].0.id().as_str(), "T-1");
        assert_eq!(near[0].1, Duration::minutes(30));

        let past_due = t0() + Duration::hours(25);
        assert!(tickets_nearing_breach(&tickets, past_due, Duration::hours(1)).is_empty());
    }
}
