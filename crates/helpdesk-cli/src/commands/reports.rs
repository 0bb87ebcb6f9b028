//! SLA report commands

use serde::Serialize;
use tabled::Tabled;

use helpdesk_core::{Notification, SlaStatus, Ticket, TicketUseCases};

use super::Context;
use crate::output::{success, warning, OutputFormat};
use crate::ReportCommands;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SlaEntry {
    id: String,
    title: String,
    priority: String,
    status: String,
    due_date: Option<String>,
    sla: String,
    breached: bool,
}

impl SlaEntry {
    fn new(ticket: &Ticket, sla: &SlaStatus) -> Self {
        Self {
            id: ticket.id().to_string(),
            title: ticket.title().to_string(),
            priority: ticket.priority().to_string(),
            status: ticket.status().to_string(),
            due_date: ticket.due_date().map(|d| d.to_rfc3339()),
            sla: sla.to_string(),
            breached: sla.is_breached(),
        }
    }
}

#[derive(Tabled)]
struct SlaRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "SLA")]
    sla: String,
}

impl From<&SlaEntry> for SlaRow {
    fn from(e: &SlaEntry) -> Self {
        Self {
            id: e.id.clone(),
            title: e.title.clone(),
            priority: e.priority.clone(),
            status: e.status.clone(),
            sla: e.sla.clone(),
        }
    }
}

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Link")]
    link: String,
}

impl From<&Notification> for AlertRow {
    fn from(n: &Notification) -> Self {
        Self {
            title: n.title.clone(),
            message: n.message.clone(),
            link: n.link.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(action: ReportCommands, ctx: &Context) -> anyhow::Result<()> {
    match action {
        ReportCommands::Compliance => {
            let report = ctx.service.compliance_report().await?;
            match ctx.format {
                OutputFormat::Table => success(format!(
                    "SLA compliance: {:.1}% ({} finished of {} tickets)",
                    report.compliance_rate, report.finished_tickets, report.total_tickets
                )),
                format => format.print(&report),
            }
        }
        ReportCommands::Sla => {
            let entries: Vec<SlaEntry> = ctx
                .service
                .sla_report()
                .await?
                .iter()
                .map(|(ticket, sla)| SlaEntry::new(ticket, sla))
                .collect();
            ctx.format.print_rows(&entries, |e| SlaRow::from(e));
            let breached = entries.iter().filter(|e| e.breached).count();
            if breached > 0 && matches!(ctx.format, OutputFormat::Table) {
                warning(format!("{} ticket(s) past their SLA deadline", breached));
            }
        }
        ReportCommands::Alerts { as_user } => {
            let viewer = ctx.actor(as_user)?;
            let alerts = ctx.service.sla_alerts(&viewer).await?;
            ctx.format.print_rows(&alerts, |n| AlertRow::from(n));
        }
    }
    Ok(())
}
