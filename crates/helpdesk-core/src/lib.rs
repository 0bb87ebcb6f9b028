//! Helpdesk Core
//!
//! Ticket lifecycle and escalation engine for a self-hosted help desk.
//!
//! ## Architecture
//!
//! - **Domain Layer**: ticket aggregate, identity snapshots, domain events and
//!   pure services (permissions, workflow, SLA, escalation, tagging)
//! - **Ports Layer**: hexagonal interfaces for the ticket store, the team
//!   directory, the notification sink, the event publisher and the clock
//! - **Application Layer**: notification dispatch, use-case orchestration and
//!   the periodic escalation monitor
//! - **Infrastructure Layer**: in-memory and JSON-file stores, a static
//!   directory, notification sinks and event publishers
//!
//! Every domain operation is copy-on-write: it takes the current ticket
//! snapshot and returns a new one, leaving the argument untouched.

pub mod config;
pub mod domain;
pub mod application;
pub mod ports;
pub mod infrastructure;

pub use config::{ConfigError, OrganizationConfig};
pub use domain::aggregates::{
    AssigneeSnapshot, Attachment, CreatorSnapshot, EscalationLevel, EscalationTarget, LinkedTicket,
    NewTicket, Relationship, Role, Ticket, TicketPriority, TicketStatus, User,
};
pub use domain::events::{TicketEscalation, TicketEvent};
pub use domain::services::escalation::{
    EscalationDecision, EscalationOutcome, EscalationRequest, EscalationTrigger,
};
pub use domain::services::workflow::TicketAction;
pub use domain::services::sla::SlaStatus;
pub use domain::value_objects::{TeamId, TicketId, Timestamp, UserId};
pub use domain::TicketError;
pub use application::{
    ComplianceReport, EscalationMonitor, MonitorSnapshot, MonitorStats, NotificationDispatcher, TicketService,
    TicketView,
};
pub use ports::inbound::{TicketUseCases, UseCaseError};
pub use ports::outbound::{
    Clock, EventPublisher, Notification, NotificationCategory, NotificationKind, NotificationSink,
    RepositoryError, SystemClock, TeamDirectory, TicketRepository,
};
