//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod commands;
pub mod dto;
pub mod monitor;
pub mod notifications;

pub use commands::TicketService;
pub use dto::*;
pub use monitor::{EscalationMonitor, MonitorSnapshot, MonitorStats};
pub use notifications::NotificationDispatcher;
