//! Aggregates module

pub mod ticket;
pub mod user;

pub use ticket::{
    AssigneeSnapshot, Attachment, CreatorSnapshot, EscalationLevel, EscalationTarget, LinkedTicket,
    NewTicket, Relationship, Ticket, TicketPriority, TicketStatus,
};
pub use user::{Role, User};

#[cfg(test)]
pub(crate) use ticket::fixtures;
