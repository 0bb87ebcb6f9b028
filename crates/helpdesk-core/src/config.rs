//! Organization configuration
//!
//! Notification switches, workflow stage metadata, category SLA overrides and
//! the SLA/escalation policy constants. Every section is optional: a missing
//! or partial file falls back to the built-in defaults.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::aggregates::{TicketPriority, TicketStatus};
use crate::domain::value_objects::Timestamp;

/// Default SLA for a category with no override
pub const DEFAULT_CATEGORY_SLA_HOURS: u32 = 24;

/// Upper bound for every configured day count (one hundred years)
pub const MAX_POLICY_DAYS: i64 = 36_500;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config value out of range: {field} = {value} (allowed 0..={max})")]
    OutOfRange { field: String, value: i64, max: i64 },
}

fn check_range(field: &str, value: i64, max: i64) -> Result<(), ConfigError> {
    if (0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field: field.to_string(), value, max })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub categories: Vec<CategoryConfig>,
    pub workflow_stages: Vec<WorkflowStage>,
    pub notifications: NotificationSettings,
    pub sla: SlaSettings,
    pub escalation: EscalationSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<String>,
    #[serde(default)]
    pub sla_hours: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStage {
    pub status: TicketStatus,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub on_ticket_creation: bool,
    pub on_ticket_assignment: bool,
    pub on_ticket_update: bool,
    pub on_ticket_resolution: bool,
    pub on_sla_breach: bool,
    pub daily_digest: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            on_ticket_creation: true,
            on_ticket_assignment: true,
            on_ticket_update: true,
            on_ticket_resolution: true,
            on_sla_breach: true,
            daily_digest: false,
        }
    }
}

/// Priority deadlines and SLA status thresholds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaSettings {
    pub urgent_days: i64,
    pub high_days: i64,
    pub medium_days: i64,
    pub low_days: i64,
    /// Below this many hours to breach a ticket is "at risk"
    pub at_risk_hours: i64,
    /// Below this many minutes to breach a ticket is "critical" and alerts fire
    pub critical_minutes: i64,
}

impl Default for SlaSettings {
    fn default() -> Self {
        Self {
            urgent_days: 1,
            high_days: 2,
            medium_days: 3,
            low_days: 5,
            at_risk_hours: 4,
            critical_minutes: 60,
        }
    }
}

impl SlaSettings {
    pub fn policy_days(&self, priority: TicketPriority) -> i64 {
        match priority {
            TicketPriority::Urgent => self.urgent_days,
            TicketPriority::High => self.high_days,
            TicketPriority::Medium => self.medium_days,
            TicketPriority::Low => self.low_days,
        }
    }

    /// `None` when the offset leaves the representable time range
    pub fn due_date(&self, created: Timestamp, priority: TicketPriority) -> Option<Timestamp> {
        Duration::try_days(self.policy_days(priority)).and_then(|d| created.checked_add_signed(d))
    }

    pub fn at_risk_window(&self) -> Option<Duration> {
        Duration::try_hours(self.at_risk_hours)
    }

    pub fn critical_window(&self) -> Option<Duration> {
        Duration::try_minutes(self.critical_minutes)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range("sla.urgent_days", self.urgent_days, MAX_POLICY_DAYS)?;
        check_range("sla.high_days", self.high_days, MAX_POLICY_DAYS)?;
        check_range("sla.medium_days", self.medium_days, MAX_POLICY_DAYS)?;
        check_range("sla.low_days", self.low_days, MAX_POLICY_DAYS)?;
        check_range("sla.at_risk_hours", self.at_risk_hours, MAX_POLICY_DAYS * 24)?;
        check_range("sla.critical_minutes", self.critical_minutes, MAX_POLICY_DAYS * 24 * 60)
    }
}

/// Which timestamp starts the tier-2 "stale after escalation" timer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleTimerBasis {
    /// `last_escalated_at`, falling back to `updated` for tickets without it
    #[default]
    LastEscalation,
    /// `updated`; any edit after tier 1 restarts the timer
    LastUpdate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationSettings {
    pub stale_open_days: i64,
    pub tier2_grace_days: i64,
    pub stale_after_escalation_days: i64,
    pub stale_timer: StaleTimerBasis,
    pub check_interval_secs: u64,
}

impl EscalationSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("escalation.stale_open_days", self.stale_open_days, MAX_POLICY_DAYS)?;
        check_range("escalation.tier2_grace_days", self.tier2_grace_days, MAX_POLICY_DAYS)?;
        check_range(
            "escalation.stale_after_escalation_days",
            self.stale_after_escalation_days,
            MAX_POLICY_DAYS,
        )
    }
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            stale_open_days: 3,
            tier2_grace_days: 1,
            stale_after_escalation_days: 3,
            stale_timer: StaleTimerBasis::LastEscalation,
            check_interval_secs: 60,
        }
    }
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryConfig::new("technical", "Technical", &["Hardware", "Software", "Network", "Security"], 24),
                CategoryConfig::new("billing", "Billing", &["Invoice", "Payment", "Refund", "Subscription"], 48),
                CategoryConfig::new("account", "Account", &["Password", "Permissions", "Profile", "Access"], 12),
                CategoryConfig::new("general", "General", &["Question", "Feedback", "Other"], 72),
            ],
            workflow_stages: vec![
                WorkflowStage::new(TicketStatus::Open, "Open", "blue"),
                WorkflowStage::new(TicketStatus::InProgress, "In Progress", "yellow"),
                WorkflowStage::new(TicketStatus::Resolved, "Resolved", "green"),
                WorkflowStage::new(TicketStatus::Closed, "Closed", "gray"),
            ],
            notifications: NotificationSettings::default(),
            sla: SlaSettings::default(),
            escalation: EscalationSettings::default(),
        }
    }
}

impl CategoryConfig {
    fn new(id: &str, name: &str, subcategories: &[&str], sla_hours: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            subcategories: subcategories.iter().map(|s| s.to_string()).collect(),
            sla_hours: Some(sla_hours),
        }
    }
}

impl WorkflowStage {
    fn new(status: TicketStatus, name: &str, color: &str) -> Self {
        Self { status, name: name.to_string(), description: None, color: Some(color.to_string()) }
    }
}

impl OrganizationConfig {
    /// Parse and range-check a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject negative or out-of-range durations
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sla.validate()?;
        self.escalation.validate()?;
        for category in &self.categories {
            if let Some(hours) = category.sla_hours {
                check_range(
                    &format!("categories.{}.sla_hours", category.id),
                    i64::from(hours),
                    MAX_POLICY_DAYS * 24,
                )?;
            }
        }
        Ok(())
    }

    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "organization config not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn sla_hours_for_category(&self, category_id: &str) -> u32 {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .and_then(|c| c.sla_hours)
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_CATEGORY_SLA_HOURS)
    }

    /// Display name of a workflow stage, or the plain status name
    pub fn stage_name(&self, status: TicketStatus) -> String {
        self.workflow_stages
            .iter()
            .find(|s| s.status == status)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| status.as_str().to_string())
    }

    pub fn stage_color(&self, status: TicketStatus) -> Option<&str> {
        self.workflow_stages
            .iter()
            .find(|s| s.status == status)
            .and_then(|s| s.color.as_deref())
    }
}
