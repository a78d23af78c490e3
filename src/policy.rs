//! Ownership rules for tickets.
//!
//! Route handlers gate on role first; these checks decide whether a caller
//! that passed the role gate may touch one specific ticket.

use uuid::Uuid;

use crate::{
    entity::users::Role,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    View,
    UpdateStatus,
    AddService,
}

/// User ids of the two parties a ticket belongs to.
#[derive(Debug, Clone, Copy)]
pub struct TicketOwnership {
    pub client_user_id: Uuid,
    pub technician_user_id: Uuid,
}

pub fn is_allowed(actor: &AuthUser, ownership: &TicketOwnership, action: TicketAction) -> bool {
    let assigned = actor.user_id == ownership.technician_user_id;
    let requester = actor.user_id == ownership.client_user_id;
    match (actor.role, action) {
        // only the assigned technician appends line items
        (Role::Admin, TicketAction::AddService) => false,
        (Role::Admin, _) => true,
        (Role::Technician, _) => assigned,
        (Role::Client, TicketAction::View) => requester,
        (Role::Client, _) => false,
    }
}

pub fn authorize_ticket(
    actor: &AuthUser,
    ownership: &TicketOwnership,
    action: TicketAction,
) -> AppResult<()> {
    if is_allowed(actor, ownership, action) {
        return Ok(());
    }
    let message = match action {
        TicketAction::View => "You do not have permission to view this ticket",
        TicketAction::UpdateStatus => "You do not have permission to change this ticket",
        TicketAction::AddService => "You do not have permission to add services to this ticket",
    };
    Err(AppError::Forbidden(message.into()))
}
