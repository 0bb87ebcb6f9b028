//! Outbound ports
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::aggregates::{Role, Ticket, User};
use crate::domain::events::TicketEvent;
use crate::domain::value_objects::{TeamId, TicketId, Timestamp, UserId};

/// Ticket store. The core hands it whole tickets and never partial updates.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Find ticket by ID
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError>;

    /// All stored tickets
    async fn find_all(&self) -> Result<Vec<Ticket>, RepositoryError>;

    /// Save ticket (insert or update)
    async fn save(&self, ticket: &Ticket) -> Result<(), RepositoryError>;

    /// Save several tickets so that either all or none are written
    async fn save_all(&self, tickets: &[Ticket]) -> Result<(), RepositoryError>;

    /// Delete ticket
    async fn delete(&self, id: &TicketId) -> Result<(), RepositoryError>;
}

/// Read-only team and user directory.
///
/// A missing team leader or an empty manager list is a normal outcome.
pub trait TeamDirectory: Send + Sync {
    fn team_leader(&self, team_id: &TeamId) -> Option<User>;

    /// Managers in directory order; escalation picks the first
    fn managers(&self) -> Vec<User>;

    fn find_user(&self, id: &UserId) -> Option<User>;
}

/// Write-only notification sink. Rendering, storage or email is the
/// implementation's business.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: Notification);
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<TicketEvent>) -> Result<(), RepositoryError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NotificationCategory>,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        user_id: UserId,
    ) -> Self {
        Self { title: title.into(), message: message.into(), kind, user_id, link: None, category: None }
    }

    pub fn for_ticket(mut self, ticket_id: &TicketId) -> Self {
        self.link = Some(format!("/tickets/{}", ticket_id));
        self
    }

    pub fn in_category(mut self, category: NotificationCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Escalation-category, or wording that would reveal an escalation
    pub fn mentions_escalation(&self) -> bool {
        self.category == Some(NotificationCategory::Escalation)
            || self.title.to_lowercase().contains("escalat")
            || self.message.to_lowercase().contains("escalat")
    }

    /// End users never see escalation or SLA-breach notices
    pub fn visible_to(&self, role: Role) -> bool {
        role != Role::User || !self.mentions_escalation()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Escalation,
}

/// Repository error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Entity not found")]
    NotFound,

    #[error("Storage io error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalation_wording_hidden_from_end_users() {
        let note = Notification::new("Ticket Escalated", "Ticket #T-1 moved up", NotificationKind::Warning, UserId::from("3"));
        assert!(!note.visible_to(Role::User));
        assert!(note.visible_to(Role::Agent));

        let generic = Notification::new("Your Ticket Has Been Updated", "is being processed", NotificationKind::Info, UserId::from("3"));
        assert!(generic.visible_to(Role::User));

        let tagged = generic.clone().in_category(NotificationCategory::Escalation);
        assert!(!tagged.visible_to(Role::User));
    }

    #[test]
    fn test_notification_json_shape() {
        let note = Notification::new("t", "m", NotificationKind::Success, UserId::from("1"))
            .for_ticket(&TicketId::from("T-9"));
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["userId"], "1");
        assert_eq!(json["link"], "/tickets/T-9");
        assert!(json.get("category").is_none());
    }
}
