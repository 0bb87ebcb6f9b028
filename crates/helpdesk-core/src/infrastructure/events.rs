//! Event publishers

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::events::TicketEvent;
use crate::ports::outbound::{EventPublisher, RepositoryError};

/// Records published events in order
#[derive(Default)]
pub struct InMemoryEventLog {
    events: Mutex<Vec<TicketEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TicketEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventLog {
    async fn publish(&self, events: Vec<TicketEvent>) -> Result<(), RepositoryError> {
        self.events.lock().extend(events);
        Ok(())
    }
}

/// Emits one debug line per event
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, events: Vec<TicketEvent>) -> Result<(), RepositoryError> {
        for event in events {
            let payload = serde_json::to_string(&event)?;
            tracing::debug!(event_type = event.event_type(), ticket_id = %event.ticket_id(), %payload, "domain event");
        }
        Ok(())
    }
}
