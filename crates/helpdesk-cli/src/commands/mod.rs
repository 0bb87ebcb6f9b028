//! Command implementations

pub mod config;
pub mod escalation;
pub mod reports;
pub mod tickets;

use anyhow::{anyhow, Context as _};
use std::sync::Arc;

use helpdesk_core::infrastructure::{
    JsonFileTicketRepository, LoggingEventPublisher, LoggingNotificationSink, StaticDirectory,
};
use helpdesk_core::{OrganizationConfig, SystemClock, TeamDirectory, TicketService, User, UserId};

use crate::config::Settings;
use crate::output::OutputFormat;

/// Wired ticket service plus what the commands need around it
pub struct Context {
    pub service: Arc<TicketService>,
    pub directory: Arc<StaticDirectory>,
    pub org: Arc<OrganizationConfig>,
    pub format: OutputFormat,
    default_user: Option<String>,
}

impl Context {
    pub fn open(settings: &Settings) -> anyhow::Result<Self> {
        let org = Arc::new(
            OrganizationConfig::load(&settings.org_config)
                .with_context(|| format!("loading {}", settings.org_config.display()))?,
        );
        let directory = Arc::new(
            StaticDirectory::load(&settings.directory)
                .with_context(|| format!("loading {}", settings.directory.display()))?,
        );
        tracing::debug!(
            store = %settings.store.display(),
            users = directory.users.len(),
            "opening ticket store"
        );

        let service = TicketService::new(
            Arc::new(JsonFileTicketRepository::new(&settings.store)),
            directory.clone(),
            Arc::new(LoggingNotificationSink),
            Arc::new(LoggingEventPublisher),
            Arc::new(SystemClock),
            org.clone(),
        );

        Ok(Self {
            service: Arc::new(service),
            directory,
            org,
            format: settings.format,
            default_user: settings.default_user.clone(),
        })
    }

    /// The acting user: `--as`, else the profile's default user
    pub fn actor(&self, as_user: Option<String>) -> anyhow::Result<User> {
        let id = as_user
            .or_else(|| self.default_user.clone())
            .ok_or_else(|| anyhow!("No acting user: pass --as USER_ID or set default_user"))?;
        self.user(&id)
    }

    pub fn user(&self, id: &str) -> anyhow::Result<User> {
        self.directory
            .find_user(&UserId::from(id))
            .ok_or_else(|| anyhow!("Unknown user: {}", id))
    }
}
