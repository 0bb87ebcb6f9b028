//! Infrastructure layer
//!
//! Adapters for the outbound ports.

pub mod clock;
pub mod directory;
pub mod events;
pub mod notifications;
pub mod persistence;

pub use clock::ManualClock;
pub use directory::{DirectoryError, StaticDirectory, Team};
pub use events::{InMemoryEventLog, LoggingEventPublisher};
pub use notifications::{InMemoryNotificationSink, LoggingNotificationSink};
pub use persistence::{InMemoryTicketRepository, JsonFileTicketRepository};
