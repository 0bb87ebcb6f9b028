//! Ticket repositories

mod json_file;

pub use json_file::JsonFileTicketRepository;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::aggregates::Ticket;
use crate::domain::value_objects::TicketId;
use crate::ports::outbound::{RepositoryError, TicketRepository};

/// In-memory ticket repository. Ticket order follows insertion.
#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: RwLock<Vec<Ticket>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        Self { tickets: RwLock::new(tickets) }
    }

    pub fn len(&self) -> usize {
        self.tickets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.read().is_empty()
    }
}

/// Insert or replace, keeping the position of existing tickets
pub(crate) fn upsert(tickets: &mut Vec<Ticket>, ticket: &Ticket) {
    match tickets.iter_mut().find(|t| t.id() == ticket.id()) {
        Some(slot) => *slot = ticket.clone(),
        None => tickets.push(ticket.clone()),
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError> {
        Ok(self.tickets.read().iter().find(|t| t.id() == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Ticket>, RepositoryError> {
        Ok(self.tickets.read().clone())
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        upsert(&mut self.tickets.write(), ticket);
        Ok(())
    }

    async fn save_all(&self, tickets: &[Ticket]) -> Result<(), RepositoryError> {
        let mut stored = self.tickets.write();
        for ticket in tickets {
            upsert(&mut stored, ticket);
        }
        Ok(())
    }

    async fn delete(&self, id: &TicketId) -> Result<(), RepositoryError> {
        let mut stored = self.tickets.write();
        let before = stored.len();
        stored.retain(|t| t.id() != id);
        if stored.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
