use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::tickets::{
        AddTicketServiceRequest, CreateTicketRequest, TicketList, UpdateTicketStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::TicketView,
    response::ApiResponse,
    routes::params::TicketListQuery,
    services::ticket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_tickets).post(create_ticket))
        .route("/my-tickets", get(list_my_tickets))
        .route("/assigned", get(list_assigned_tickets))
        .route("/{id}", get(get_ticket))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/services", post(add_service))
}

#[utoipa::path(
    get,
    path = "/api/tickets",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "OPEN, IN_PROGRESS or CLOSED"),
        ("sort_order" = Option<String>, Query, description = "Sort by creation date: asc, desc")
    ),
    responses(
        (status = 200, description = "All tickets (admin only)", body = ApiResponse<TicketList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn list_all_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = ticket_service::list_all_tickets(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket opened", body = ApiResponse<TicketView>),
        (status = 404, description = "Technician or service not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTicketRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TicketView>>)> {
    let resp = ticket_service::create_ticket(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/tickets/my-tickets",
    responses(
        (status = 200, description = "Tickets opened by the caller", body = ApiResponse<TicketList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn list_my_tickets(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = ticket_service::list_my_tickets(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tickets/assigned",
    responses(
        (status = 200, description = "Assigned tickets", body = ApiResponse<TicketList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn list_assigned_tickets(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = ticket_service::list_assigned_tickets(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket with lines and total", body = ApiResponse<TicketView>),
        (status = 403, description = "Not a party to this ticket"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TicketView>>> {
    let resp = ticket_service::get_ticket(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/tickets/{id}/status",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = UpdateTicketStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<TicketView>),
        (status = 403, description = "Not allowed to update this ticket"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketStatusRequest>,
) -> AppResult<Json<ApiResponse<TicketView>>> {
    let resp = ticket_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/services",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = AddTicketServiceRequest,
    responses(
        (status = 201, description = "Service appended", body = ApiResponse<TicketView>),
        (status = 403, description = "Not assigned, or ticket closed"),
        (status = 404, description = "Ticket or service not found"),
        (status = 409, description = "Service already on the ticket")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn add_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddTicketServiceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TicketView>>)> {
    let resp = ticket_service::add_service(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
