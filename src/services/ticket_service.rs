use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::tickets::{
        AddTicketServiceRequest, CreateTicketRequest, TicketList, UpdateTicketStatusRequest,
    },
    entity::{
        clients::{Column as ClientCol, Entity as Clients, Model as ClientModel},
        services::{Column as ServiceCol, Entity as Services},
        technicians::{Column as TechCol, Entity as Technicians, Model as TechnicianModel},
        ticket_services::{ActiveModel as LineActive, Column as LineCol, Entity as TicketServices},
        tickets::{
            ActiveModel as TicketActive, Column as TicketCol, Entity as Tickets,
            Model as TicketModel, TicketStatus,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{
        AuthUser, ensure_admin, ensure_admin_or_technician, ensure_client, ensure_technician,
    },
    models::{TicketClient, TicketLine, TicketTechnician, TicketView},
    policy::{TicketAction, TicketOwnership, authorize_ticket},
    response::{ApiResponse, Meta},
    routes::params::{SortOrder, TicketListQuery},
    state::AppState,
    validation::Validate,
};

/// Sum of the snapshot prices of a ticket's lines.
pub fn total_price(lines: &[TicketLine]) -> Decimal {
    lines.iter().map(|line| line.price).sum()
}

pub async fn create_ticket(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTicketRequest,
) -> AppResult<ApiResponse<TicketView>> {
    ensure_client(user)?;
    payload.validate()?;

    let mut service_ids = payload.service_ids.clone();
    service_ids.sort();
    service_ids.dedup();

    let txn = state.orm.begin().await?;

    let client = client_for_user(&txn, user.user_id).await?;
    let technician = Technicians::find_by_id(payload.technician_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Technician"))?;

    let services = Services::find()
        .filter(
            Condition::all()
                .add(ServiceCol::Id.is_in(service_ids.clone()))
                .add(ServiceCol::IsActive.eq(true)),
        )
        .all(&txn)
        .await?;

    if services.len() != service_ids.len() {
        return Err(AppError::NotFound(
            "One or more services were not found or are inactive".into(),
        ));
    }

    let ticket = TicketActive {
        id: Set(Uuid::new_v4()),
        client_id: Set(client.id),
        technician_id: Set(technician.id),
        status: Set(TicketStatus::Open),
        description: Set(payload.description),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let lines = services.iter().map(|service| LineActive {
        id: Set(Uuid::new_v4()),
        ticket_id: Set(ticket.id),
        service_id: Set(service.id),
        price: Set(service.price),
        added_by_technician: Set(false),
        created_at: NotSet,
    });
    TicketServices::insert_many(lines).exec(&txn).await?;

    let view = load_view(&txn, ticket).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_create",
        "tickets",
        serde_json::json!({ "ticket_id": view.id, "total_price": view.total_price }),
    )
    .await;

    tracing::info!(ticket_id = %view.id, technician_id = %technician.id, "ticket created");

    Ok(ApiResponse::success("Ticket created", view, Some(Meta::empty())))
}

pub async fn list_all_tickets(
    state: &AppState,
    user: &AuthUser,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(TicketCol::Status.eq(status));
    }

    let mut finder = Tickets::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(TicketCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(TicketCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let tickets = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_views(&state.orm, tickets).await?;

    Ok(ApiResponse::success(
        "Tickets",
        TicketList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_ticket(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<TicketView>> {
    let ticket = Tickets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Ticket"))?;

    let owners = ownership(&state.orm, &ticket).await?;
    authorize_ticket(user, &owners, TicketAction::View)?;

    let view = load_view(&state.orm, ticket).await?;
    Ok(ApiResponse::success("Ticket", view, Some(Meta::empty())))
}

pub async fn list_my_tickets(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<TicketList>> {
    ensure_client(user)?;
    let client = client_for_user(&state.orm, user.user_id).await?;
    let items = tickets_for_client(&state.orm, client.id).await?;
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Tickets", TicketList { items }, Some(meta)))
}

pub async fn list_assigned_tickets(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<TicketList>> {
    ensure_technician(user)?;
    let technician = technician_for_user(&state.orm, user.user_id).await?;
    let items = tickets_for_technician(&state.orm, technician.id).await?;
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Tickets", TicketList { items }, Some(meta)))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTicketStatusRequest,
) -> AppResult<ApiResponse<TicketView>> {
    ensure_admin_or_technician(user)?;

    let ticket = Tickets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Ticket"))?;

    let owners = ownership(&state.orm, &ticket).await?;
    authorize_ticket(user, &owners, TicketAction::UpdateStatus)?;

    let previous = ticket.status;
    let mut active: TicketActive = ticket.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let ticket = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_status_update",
        "tickets",
        serde_json::json!({ "ticket_id": ticket.id, "from": previous, "to": ticket.status }),
    )
    .await;

    let view = load_view(&state.orm, ticket).await?;
    Ok(ApiResponse::success("Ticket updated", view, Some(Meta::empty())))
}

pub async fn add_service(
    state: &AppState,
    user: &AuthUser,
    ticket_id: Uuid,
    payload: AddTicketServiceRequest,
) -> AppResult<ApiResponse<TicketView>> {
    ensure_technician(user)?;

    let txn = state.orm.begin().await?;

    // Row lock keeps a concurrent status change from closing the ticket mid-append.
    let ticket = Tickets::find_by_id(ticket_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Ticket"))?;

    let owners = ownership(&txn, &ticket).await?;
    authorize_ticket(user, &owners, TicketAction::AddService)?;

    if ticket.status == TicketStatus::Closed {
        return Err(AppError::Forbidden(
            "Cannot add services to a closed ticket".into(),
        ));
    }

    let service = Services::find_by_id(payload.service_id)
        .one(&txn)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::NotFound("Service not found or inactive".into()))?;

    let already_attached = TicketServices::find()
        .filter(
            Condition::all()
                .add(LineCol::TicketId.eq(ticket.id))
                .add(LineCol::ServiceId.eq(service.id)),
        )
        .one(&txn)
        .await?
        .is_some();
    if already_attached {
        return Err(AppError::Conflict(
            "This service is already attached to the ticket".into(),
        ));
    }

    LineActive {
        id: Set(Uuid::new_v4()),
        ticket_id: Set(ticket.id),
        service_id: Set(service.id),
        price: Set(service.price),
        added_by_technician: Set(true),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|e| {
        AppError::conflict_on_unique(e, "This service is already attached to the ticket")
    })?;

    let view = load_view(&txn, ticket).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "ticket_service_add",
        "tickets",
        serde_json::json!({
            "ticket_id": view.id,
            "service_id": service.id,
            "price": service.price,
        }),
    )
    .await;

    Ok(ApiResponse::success("Service added", view, Some(Meta::empty())))
}

pub async fn client_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<ClientModel> {
    Clients::find()
        .filter(ClientCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Client"))
}

pub async fn technician_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<TechnicianModel> {
    Technicians::find()
        .filter(TechCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Technician"))
}

pub async fn tickets_for_client<C: ConnectionTrait>(
    conn: &C,
    client_id: Uuid,
) -> AppResult<Vec<TicketView>> {
    let tickets = Tickets::find()
        .filter(TicketCol::ClientId.eq(client_id))
        .order_by_desc(TicketCol::CreatedAt)
        .all(conn)
        .await?;
    load_views(conn, tickets).await
}

pub async fn tickets_for_technician<C: ConnectionTrait>(
    conn: &C,
    technician_id: Uuid,
) -> AppResult<Vec<TicketView>> {
    let tickets = Tickets::find()
        .filter(TicketCol::TechnicianId.eq(technician_id))
        .order_by_desc(TicketCol::CreatedAt)
        .all(conn)
        .await?;
    load_views(conn, tickets).await
}

async fn ownership<C: ConnectionTrait>(
    conn: &C,
    ticket: &TicketModel,
) -> AppResult<TicketOwnership> {
    let client = Clients::find_by_id(ticket.client_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("ticket {} has no client", ticket.id)))?;
    let technician = Technicians::find_by_id(ticket.technician_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("ticket {} has no technician", ticket.id))
        })?;
    Ok(TicketOwnership {
        client_user_id: client.user_id,
        technician_user_id: technician.user_id,
    })
}

async fn load_view<C: ConnectionTrait>(conn: &C, ticket: TicketModel) -> AppResult<TicketView> {
    let mut views = load_views(conn, vec![ticket]).await?;
    views
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("ticket view missing")))
}

/// Builds the aggregated views for a batch of tickets with one query per
/// related table, preserving the input order.
pub async fn load_views<C: ConnectionTrait>(
    conn: &C,
    tickets: Vec<TicketModel>,
) -> AppResult<Vec<TicketView>> {
    if tickets.is_empty() {
        return Ok(Vec::new());
    }

    let ticket_ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();
    let client_ids: Vec<Uuid> = tickets
        .iter()
        .map(|t| t.client_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let technician_ids: Vec<Uuid> = tickets
        .iter()
        .map(|t| t.technician_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut lines: HashMap<Uuid, Vec<TicketLine>> = HashMap::new();
    let rows = TicketServices::find()
        .filter(LineCol::TicketId.is_in(ticket_ids))
        .order_by_asc(LineCol::AddedByTechnician)
        .order_by_asc(LineCol::CreatedAt)
        .find_also_related(Services)
        .all(conn)
        .await?;
    for (line, service) in rows {
        lines.entry(line.ticket_id).or_default().push(TicketLine {
            id: line.service_id,
            name: service.map(|s| s.name).unwrap_or_default(),
            price: line.price,
            added_by_technician: line.added_by_technician,
        });
    }

    let clients: HashMap<Uuid, TicketClient> = Clients::find()
        .filter(ClientCol::Id.is_in(client_ids))
        .find_also_related(Users)
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(client, user)| {
            user.map(|u| {
                (
                    client.id,
                    TicketClient {
                        id: client.id,
                        name: u.name,
                        email: u.email,
                    },
                )
            })
        })
        .collect();

    let technicians: HashMap<Uuid, TicketTechnician> = Technicians::find()
        .filter(TechCol::Id.is_in(technician_ids))
        .find_also_related(Users)
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(technician, user)| {
            user.map(|u| {
                (
                    technician.id,
                    TicketTechnician {
                        id: technician.id,
                        name: u.name,
                    },
                )
            })
        })
        .collect();

    let views = tickets
        .into_iter()
        .map(|ticket| {
            let services = lines.remove(&ticket.id).unwrap_or_default();
            TicketView {
                id: ticket.id,
                status: ticket.status,
                description: ticket.description,
                client: clients.get(&ticket.client_id).map(|c| TicketClient {
                    id: c.id,
                    name: c.name.clone(),
                    email: c.email.clone(),
                }),
                technician: technicians.get(&ticket.technician_id).map(|t| TicketTechnician {
                    id: t.id,
                    name: t.name.clone(),
                }),
                total_price: total_price(&services),
                services,
                created_at: ticket.created_at.with_timezone(&Utc),
                updated_at: ticket.updated_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(views)
}
