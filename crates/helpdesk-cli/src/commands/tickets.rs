//! Ticket commands

use anyhow::anyhow;
use tabled::Tabled;

use helpdesk_core::{
    AssigneeSnapshot, Clock, CreatorSnapshot, NewTicket, Relationship, SystemClock, Ticket, TicketId,
    TicketPriority, TicketStatus, TicketUseCases, TicketView, User,
};

use super::Context;
use crate::output::success;
use crate::TicketCommands;

#[derive(Tabled)]
struct TicketRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "SLA")]
    sla: String,
}

impl From<&TicketView> for TicketRow {
    fn from(view: &TicketView) -> Self {
        Self {
            id: view.id.clone(),
            title: view.title.clone(),
            status: view.status.clone(),
            priority: view.priority.clone(),
            assignee: view.assignee.clone().unwrap_or_else(|| "-".to_string()),
            due: view
                .due_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            sla: view.sla.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub async fn handle(action: TicketCommands, ctx: &Context) -> anyhow::Result<()> {
    let service = &ctx.service;
    match action {
        TicketCommands::List { status, as_user } => {
            let viewer = ctx.actor(as_user)?;
            let status = status.as_deref().map(parse_status).transpose()?;
            let tickets = service.list_tickets(&viewer).await?;
            let views: Vec<TicketView> = tickets
                .iter()
                .filter(|t| status.map_or(true, |s| t.status() == s))
                .map(|t| view(ctx, t, &viewer))
                .collect();
            ctx.format.print_rows(&views, |v| TicketRow::from(v));
        }
        TicketCommands::Show { id, as_user } => {
            let viewer = ctx.actor(as_user)?;
            let ticket = service.get_ticket(&TicketId::from(id), &viewer).await?;
            ctx.format.print(&view(ctx, &ticket, &viewer));
        }
        TicketCommands::Create { title, description, category, subcategory, priority, assignee, as_user } => {
            let creator = ctx.actor(as_user)?;
            let priority: TicketPriority = priority.parse().map_err(anyhow::Error::msg)?;
            let mut new = NewTicket::new(title, description, category, priority, CreatorSnapshot::from(&creator));
            new.subcategory = subcategory;
            new.assignee = match assignee {
                Some(id) => Some(AssigneeSnapshot::from(&ctx.user(&id)?)),
                None => None,
            };
            let ticket = service.create_ticket(new).await?;
            success(format!("Ticket {} created", ticket.id()));
            ctx.format.print(&view(ctx, &ticket, &creator));
        }
        TicketCommands::Status { id, status, as_user } => {
            let actor = ctx.actor(as_user)?;
            let ticket = service.update_status(&TicketId::from(id), parse_status(&status)?, &actor).await?;
            success(format!("Ticket {} is now {}", ticket.id(), ctx.org.stage_name(ticket.status())));
        }
        TicketCommands::Assign { id, assignee, as_user } => {
            let actor = ctx.actor(as_user)?;
            let assignee = ctx.user(&assignee)?;
            let ticket = service.assign(&TicketId::from(id), &assignee, &actor).await?;
            success(format!("Ticket {} assigned to {}", ticket.id(), assignee.name));
        }
        TicketCommands::Tag { id, tag } => {
            let ticket = service.add_tag(&TicketId::from(id), &tag).await?;
            success(format!("Ticket {} tags: {}", ticket.id(), ticket.tags().join(", ")));
        }
        TicketCommands::Untag { id, tag } => {
            let ticket = service.remove_tag(&TicketId::from(id), &tag).await?;
            success(format!("Ticket {} tags: {}", ticket.id(), ticket.tags().join(", ")));
        }
        TicketCommands::Link { id, target, relationship } => {
            let relationship: Relationship = relationship.parse().map_err(anyhow::Error::msg)?;
            let (source, target) = service
                .link(&TicketId::from(id), &TicketId::from(target), relationship)
                .await?;
            success(format!("Linked {} to {} ({})", source.id(), target.id(), relationship));
        }
        TicketCommands::Unlink { id, target } => {
            let (source, target_ticket) = service.unlink(&TicketId::from(id), &TicketId::from(target.as_str())).await?;
            match target_ticket {
                Some(t) => success(format!("Unlinked {} from {}", source.id(), t.id())),
                None => success(format!("Unlinked {} from {} (target no longer exists)", source.id(), target)),
            }
        }
        TicketCommands::Escalate { id, reason, as_user } => {
            let actor = ctx.actor(as_user)?;
            let escalation = service.escalate(&TicketId::from(id), &reason, &actor).await?;
            success(format!(
                "Ticket {} escalated to level {} ({})",
                escalation.ticket_id, escalation.level, escalation.escalated_to.name
            ));
        }
    }
    Ok(())
}

fn parse_status(value: &str) -> anyhow::Result<TicketStatus> {
    value.parse().map_err(|e: String| anyhow!(e))
}

fn view(ctx: &Context, ticket: &Ticket, viewer: &User) -> TicketView {
    TicketView::for_viewer(ticket, viewer.role, SystemClock.now(), &ctx.org.sla)
}
