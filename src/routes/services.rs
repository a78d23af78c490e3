use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::services::{CreateServiceRequest, ServiceList, UpdateServiceRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Service,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active).post(create_service))
        .route("/all", get(list_all))
        .route("/{id}", get(get_service).put(update_service))
        .route("/{id}/activate", patch(activate_service))
        .route("/{id}/deactivate", patch(deactivate_service))
}

#[utoipa::path(
    get,
    path = "/api/services",
    responses(
        (status = 200, description = "Active services", body = ApiResponse<ServiceList>)
    ),
    tag = "Services"
)]
pub async fn list_active(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ServiceList>>> {
    let resp = catalog_service::list_active_services(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/all",
    responses(
        (status = 200, description = "Every service", body = ApiResponse<ServiceList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn list_all(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ServiceList>>> {
    let resp = catalog_service::list_all_services(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service", body = ApiResponse<Service>),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = catalog_service::get_service(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = ApiResponse<Service>),
        (status = 409, description = "Name already in use"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Service>>)> {
    let resp = catalog_service::create_service(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service updated", body = ApiResponse<Service>),
        (status = 404, description = "Service not found"),
        (status = 409, description = "Name already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequest>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = catalog_service::update_service(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/services/{id}/activate",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service activated", body = ApiResponse<Service>),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn activate_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = catalog_service::set_service_active(&state, &user, id, true).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/services/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service deactivated", body = ApiResponse<Service>),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn deactivate_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = catalog_service::set_service_active(&state, &user, id, false).await?;
    Ok(Json(resp))
}
