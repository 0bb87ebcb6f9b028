//! Ticket Aggregate
//!
//! The canonical ticket record. Mutations never happen in place: every
//! operation clones the current snapshot, applies the change and refreshes
//! `updated`, so callers holding the old value never observe the change.
//!
//! Identity fields (`created_by`, `assignee`) are value snapshots taken when
//! the ticket was written. A later role or name change on the live user does
//! not retroactively affect stored tickets.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::SlaSettings;
use crate::domain::aggregates::user::{Role, User};
use crate::domain::value_objects::{TeamId, TicketId, Timestamp, UserId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub(crate) id: TicketId,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) subcategory: Option<String>,
    pub(crate) priority: TicketPriority,
    pub(crate) status: TicketStatus,
    pub(crate) created_by: CreatorSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) assignee: Option<AssigneeSnapshot>,
    pub(crate) created: Timestamp,
    pub(crate) updated: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) due_date: Option<Timestamp>,
    #[serde(default)]
    pub(crate) escalation_level: EscalationLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) last_escalated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) team_id: Option<TeamId>,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    #[serde(default)]
    pub(crate) attachments: Vec<Attachment>,
    #[serde(default)]
    pub(crate) linked_tickets: Vec<LinkedTicket>,
}

/// Input of the create-ticket flow
#[derive(Clone, Debug)]
pub struct NewTicket {
    pub id: Option<TicketId>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub priority: TicketPriority,
    pub created_by: CreatorSnapshot,
    pub assignee: Option<AssigneeSnapshot>,
    pub attachments: Vec<Attachment>,
}

impl NewTicket {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        priority: TicketPriority,
        created_by: CreatorSnapshot,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            subcategory: None,
            priority,
            created_by,
            assignee: None,
            attachments: vec![],
        }
    }
}

impl Ticket {
    /// Create a ticket in `open` with escalation level 0 and a due date
    /// derived from its priority, or none when the policy overflows the
    /// calendar. The owning team is the creator's team.
    pub fn create(new: NewTicket, now: Timestamp, sla: &SlaSettings) -> Self {
        let team_id = new.created_by.team_id.clone();
        Self {
            id: new.id.unwrap_or_else(TicketId::generate),
            title: new.title,
            description: new.description,
            category: new.category,
            subcategory: new.subcategory,
            due_date: sla.due_date(now, new.priority),
            priority: new.priority,
            status: TicketStatus::Open,
            created_by: new.created_by,
            assignee: new.assignee,
            created: now,
            updated: now,
            escalation_level: EscalationLevel::None,
            last_escalated_at: None,
            team_id,
            tags: vec![],
            attachments: new.attachments,
            linked_tickets: vec![],
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &TicketId { &self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn description(&self) -> &str { &self.description }
    pub fn category(&self) -> &str { &self.category }
    pub fn subcategory(&self) -> Option<&str> { self.subcategory.as_deref() }
    pub fn priority(&self) -> TicketPriority { self.priority }
    pub fn status(&self) -> TicketStatus { self.status }
    pub fn created_by(&self) -> &CreatorSnapshot { &self.created_by }
    pub fn assignee(&self) -> Option<&AssigneeSnapshot> { self.assignee.as_ref() }
    pub fn created(&self) -> Timestamp { self.created }
    pub fn updated(&self) -> Timestamp { self.updated }
    pub fn due_date(&self) -> Option<Timestamp> { self.due_date }
    pub fn escalation_level(&self) -> EscalationLevel { self.escalation_level }
    pub fn last_escalated_at(&self) -> Option<Timestamp> { self.last_escalated_at }
    pub fn team_id(&self) -> Option<&TeamId> { self.team_id.as_ref() }
    pub fn tags(&self) -> &[String] { &self.tags }
    pub fn attachments(&self) -> &[Attachment] { &self.attachments }
    pub fn linked_tickets(&self) -> &[LinkedTicket] { &self.linked_tickets }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn link_to(&self, id: &TicketId) -> Option<&LinkedTicket> {
        self.linked_tickets.iter().find(|l| &l.id == id)
    }

    // =========================================================================
    // Unguarded field edits
    // =========================================================================

    /// Replace the free-text and classification fields
    pub fn with_details(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        subcategory: Option<String>,
        now: Timestamp,
    ) -> Ticket {
        let mut next = self.clone();
        next.title = title.into();
        next.description = description.into();
        next.category = category.into();
        next.subcategory = subcategory;
        next.touch(now);
        next
    }

    pub fn assign(&self, assignee: AssigneeSnapshot, now: Timestamp) -> Ticket {
        let mut next = self.clone();
        next.assignee = Some(assignee);
        next.touch(now);
        next
    }

    pub fn unassign(&self, now: Timestamp) -> Ticket {
        let mut next = self.clone();
        next.assignee = None;
        next.touch(now);
        next
    }

    /// Attachments are append-only
    pub fn add_attachment(&self, attachment: Attachment, now: Timestamp) -> Ticket {
        let mut next = self.clone();
        next.attachments.push(attachment);
        next.touch(now);
        next
    }

    /// Refresh `updated`. The value never moves backwards and always
    /// advances, even when the caller's clock has not.
    pub(crate) fn touch(&mut self, now: Timestamp) {
        self.updated = if now > self.updated {
            now
        } else {
            self.updated + Duration::milliseconds(1)
        };
    }
}

// =============================================================================
// Supporting Types
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Declaration order carries no meaning for allowed transitions
    pub const ALL: [TicketStatus; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Resolved or closed: no further escalation
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Escalation tier: 0 none, 1 team leader, 2 manager.
/// Serialized as the bare integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EscalationLevel {
    #[default]
    None,
    TeamLeader,
    Manager,
}

impl EscalationLevel {
    pub fn value(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::TeamLeader => 1,
            Self::Manager => 2,
        }
    }

    pub fn next(&self) -> Option<EscalationLevel> {
        match self {
            Self::None => Some(Self::TeamLeader),
            Self::TeamLeader => Some(Self::Manager),
            Self::Manager => None,
        }
    }

    pub fn is_max(&self) -> bool {
        *self == Self::Manager
    }

    pub fn target_label(&self) -> &'static str {
        match self {
            Self::None => "Support Team",
            Self::TeamLeader => "Team Leader",
            Self::Manager => "Manager",
        }
    }
}

impl From<EscalationLevel> for u8 {
    fn from(level: EscalationLevel) -> u8 {
        level.value()
    }
}

impl TryFrom<u8> for EscalationLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::TeamLeader),
            2 => Ok(Self::Manager),
            other => Err(format!("escalation level out of range: {}", other)),
        }
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Creator identity copied onto the ticket at creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSnapshot {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl From<&User> for CreatorSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            team_id: user.team_id.clone(),
            emp_code: None,
            company: None,
            role: Some(user.role),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeSnapshot {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl From<&User> for AssigneeSnapshot {
    fn from(user: &User) -> Self {
        Self { id: user.id.clone(), name: user.name.clone(), role: Some(user.role) }
    }
}

/// Who an escalation was routed to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationTarget {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl From<&User> for EscalationTarget {
    fn from(user: &User) -> Self {
        Self { id: user.id.clone(), name: user.name.clone(), role: user.role }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedTicket {
    pub id: TicketId,
    pub title: String,
    pub relationship: Relationship,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Related,
    Parent,
    Child,
    Duplicate,
}

impl Relationship {
    /// Relationship recorded on the other side of a link
    pub fn reverse(&self) -> Relationship {
        match self {
            Self::Related => Self::Related,
            Self::Parent => Self::Child,
            Self::Child => Self::Parent,
            Self::Duplicate => Self::Duplicate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Related => "related",
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "related" => Ok(Self::Related),
            "parent" => Ok(Self::Parent),
            "child" => Ok(Self::Child),
            "duplicate" => Ok(Self::Duplicate),
            other => Err(format!("unknown relationship: {}", other)),
        }
    }
}
