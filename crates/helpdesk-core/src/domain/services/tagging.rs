//! Tag and link mutators

use crate::domain::aggregates::{LinkedTicket, Relationship, Ticket};
use crate::domain::value_objects::{TicketId, Timestamp};
use crate::domain::TicketError;

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Append a normalized tag. Empty or duplicate tags return the ticket unchanged.
pub fn add_tag(ticket: &Ticket, tag: &str, now: Timestamp) -> Ticket {
    let tag = normalize_tag(tag);
    if tag.is_empty() || ticket.tags.contains(&tag) {
        return ticket.clone();
    }
    let mut next = ticket.clone();
    next.tags.push(tag);
    next.touch(now);
    next
}

/// Remove a tag. Removing an absent tag leaves `updated` alone.
pub fn remove_tag(ticket: &Ticket, tag: &str, now: Timestamp) -> Ticket {
    let tag = normalize_tag(tag);
    if !ticket.tags.contains(&tag) {
        return ticket.clone();
    }
    let mut next = ticket.clone();
    next.tags.retain(|t| *t != tag);
    next.touch(now);
    next
}

/// Link `source` to `target_id` and record the reverse relationship on the
/// target. Both updated tickets are returned; neither is produced when the
/// target cannot be found among `candidates`.
pub fn link_tickets(
    source: &Ticket,
    target_id: &TicketId,
    relationship: Relationship,
    candidates: &[Ticket],
    now: Timestamp,
) -> Result<(Ticket, Ticket), TicketError> {
    if source.id() == target_id {
        return Err(TicketError::SelfLink);
    }
    let target = candidates
        .iter()
        .find(|t| t.id() == target_id)
        .ok_or_else(|| TicketError::TicketNotFound(target_id.clone()))?;
    if source.link_to(target_id).is_some() {
        return Err(TicketError::AlreadyLinked { source_id: source.id().clone(), target_id: target_id.clone() });
    }

    let mut next_source = source.clone();
    next_source.linked_tickets.push(LinkedTicket {
        id: target.id().clone(),
        title: target.title().to_string(),
        relationship,
    });
    next_source.touch(now);

    let mut next_target = target.clone();
    next_target.linked_tickets.retain(|l| l.id != *source.id());
    next_target.linked_tickets.push(LinkedTicket {
        id: source.id().clone(),
        title: source.title().to_string(),
        relationship: relationship.reverse(),
    });
    next_target.touch(now);

    Ok((next_source, next_target))
}

/// Remove the link on both sides. The target half is `None` when the target
/// no longer exists; a side without the link is returned unchanged.
pub fn unlink_tickets(
    source: &Ticket,
    target_id: &TicketId,
    candidates: &[Ticket],
    now: Timestamp,
) -> (Ticket, Option<Ticket>) {
    let next_source = without_link(source, target_id, now);
    let next_target = candidates
        .iter()
        .find(|t| t.id() == target_id)
        .map(|target| without_link(target, source.id(), now));
    (next_source, next_target)
}

fn without_link(ticket: &Ticket, other: &TicketId, now: Timestamp) -> Ticket {
    if ticket.link_to(other).is_none() {
        return ticket.clone();
    }
    let mut next = ticket.clone();
    next.linked_tickets.retain(|l| l.id != *other);
    next.touch(now);
    next
}

/// Every ticket except `current`
pub fn linkable_tickets<'a>(current: &TicketId, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
    tickets.iter().filter(|t| t.id() != current).collect()
}
