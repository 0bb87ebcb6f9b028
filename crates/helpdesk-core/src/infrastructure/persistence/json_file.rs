//! JSON file ticket store
//!
//! The whole ticket list lives in one JSON array. Every write rewrites the
//! file through a sibling temp file and a rename, so a multi-ticket save is
//! either fully on disk or not at all.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::upsert;
use crate::domain::aggregates::Ticket;
use crate::domain::value_objects::TicketId;
use crate::ports::outbound::{RepositoryError, TicketRepository};

pub struct JsonFileTicketRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTicketRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Ticket>, RepositoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(vec![]),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, tickets: &[Ticket]) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(tickets)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), tickets = tickets.len(), "ticket store written");
        Ok(())
    }
}

#[async_trait]
impl TicketRepository for JsonFileTicketRepository {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError> {
        Ok(self.read_all().await?.into_iter().find(|t| t.id() == id))
    }

    async fn find_all(&self) -> Result<Vec<Ticket>, RepositoryError> {
        self.read_all().await
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        self.save_all(std::slice::from_ref(ticket)).await
    }

    async fn save_all(&self, tickets: &[Ticket]) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.read_all().await?;
        for ticket in tickets {
            upsert(&mut stored, ticket);
        }
        self.write_all(&stored).await
    }

    async fn delete(&self, id: &TicketId) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.read_all().await?;
        let before = stored.len();
        stored.retain(|t| t.id() != id);
        if stored.len() == before {
            return Err(RepositoryError::NotFound);
        }
        self.write_all(&stored).await
    }
}
