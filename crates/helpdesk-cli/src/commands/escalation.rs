//! Escalation commands

use std::sync::Arc;
use std::time::Duration;
use tabled::Tabled;
use tokio::sync::watch;

use helpdesk_core::{EscalationMonitor, TicketEscalation, TicketUseCases};

use super::Context;
use crate::output::success;
use crate::EscalationCommands;

#[derive(Tabled)]
struct EscalationRow {
    #[tabled(rename = "Ticket")]
    ticket: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&TicketEscalation> for EscalationRow {
    fn from(e: &TicketEscalation) -> Self {
        Self {
            ticket: e.ticket_id.to_string(),
            level: e.level.to_string(),
            to: format!("{} ({})", e.escalated_to.name, e.escalated_to.role),
            reason: e.reason.clone(),
        }
    }
}

pub async fn handle(action: EscalationCommands, ctx: &Context) -> anyhow::Result<()> {
    match action {
        EscalationCommands::Check => {
            let fired = ctx.service.run_escalation_check().await?;
            ctx.format.print_rows(&fired, |e| EscalationRow::from(e));
        }
        EscalationCommands::Watch { interval_secs } => {
            let secs = interval_secs.unwrap_or(ctx.org.escalation.check_interval_secs).max(1);
            let tickets: Arc<dyn TicketUseCases> = ctx.service.clone();
            let monitor = EscalationMonitor::new(tickets, Duration::from_secs(secs));

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handle = tokio::spawn(monitor.run(shutdown_rx));

            tokio::signal::ctrl_c().await?;
            tracing::info!("shutdown requested");
            shutdown_tx.send(true)?;

            let stats = handle.await?;
            success(format!(
                "Escalation monitor stopped after {} ticks ({} escalations, {} failed)",
                stats.ticks, stats.escalations, stats.failed_ticks
            ));
        }
    }
    Ok(())
}
