//! Inbound ports
//!
//! Hexagonal architecture: these define how the outside world interacts with the domain.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::dto::ComplianceReport;
use crate::domain::aggregates::{NewTicket, Relationship, Ticket, TicketStatus, User};
use crate::domain::events::TicketEscalation;
use crate::domain::services::sla::SlaStatus;
use crate::domain::value_objects::TicketId;
use crate::domain::TicketError;
use crate::ports::outbound::{Notification, RepositoryError};

/// Ticket use cases
#[async_trait]
pub trait TicketUseCases: Send + Sync {
    /// Create a ticket from the creation form
    async fn create_ticket(&self, new: NewTicket) -> Result<Ticket, UseCaseError>;

    /// Get a ticket the viewer is allowed to see
    async fn get_ticket(&self, id: &TicketId, viewer: &User) -> Result<Ticket, UseCaseError>;

    /// Tickets visible to the viewer
    async fn list_tickets(&self, viewer: &User) -> Result<Vec<Ticket>, UseCaseError>;

    async fn update_status(&self, id: &TicketId, status: TicketStatus, actor: &User) -> Result<Ticket, UseCaseError>;

    async fn assign(&self, id: &TicketId, assignee: &User, actor: &User) -> Result<Ticket, UseCaseError>;

    async fn add_tag(&self, id: &TicketId, tag: &str) -> Result<Ticket, UseCaseError>;

    async fn remove_tag(&self, id: &TicketId, tag: &str) -> Result<Ticket, UseCaseError>;

    /// Link both tickets; both are stored or neither is
    async fn link(
        &self,
        id: &TicketId,
        target_id: &TicketId,
        relationship: Relationship,
    ) -> Result<(Ticket, Ticket), UseCaseError>;

    async fn unlink(&self, id: &TicketId, target_id: &TicketId) -> Result<(Ticket, Option<Ticket>), UseCaseError>;

    /// Manual escalation to the next level
    async fn escalate(&self, id: &TicketId, reason: &str, actor: &User) -> Result<TicketEscalation, UseCaseError>;

    /// One pass of the periodic escalation check over every ticket
    async fn run_escalation_check(&self) -> Result<Vec<TicketEscalation>, UseCaseError>;

    /// SLA compliance over every stored ticket
    async fn compliance_report(&self) -> Result<ComplianceReport, UseCaseError>;

    /// SLA status of every active ticket
    async fn sla_report(&self) -> Result<Vec<(Ticket, SlaStatus)>, UseCaseError>;

    /// Deliver near-breach alerts for `viewer` and return them
    async fn sla_alerts(&self, viewer: &User) -> Result<Vec<Notification>, UseCaseError>;
}

/// Use case error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UseCaseError {
    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl UseCaseError {
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::Ticket(e) if e.is_denial())
    }
}
