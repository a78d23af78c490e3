use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::technicians::{
        AvailableTechnicianList, CreateTechnicianRequest, TechnicianList,
        UpdateTechnicianProfileRequest, UpdateTechnicianRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{AccountInfo, CreatedTechnician, Technician, TechnicianDetail},
    response::ApiResponse,
    routes::upload::{AVATAR_BODY_LIMIT, AvatarForm, read_avatar},
    services::technician_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/available", get(list_available))
        .route("/", post(create_technician).get(list_technicians))
        .route("/profile", patch(update_profile))
        .route(
            "/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/{id}", get(get_technician).put(update_technician))
}

#[utoipa::path(
    get,
    path = "/api/technicians/available",
    responses(
        (status = 200, description = "Available", body = ApiResponse<AvailableTechnicianList>)
    ),
    tag = "Technicians"
)]
pub async fn list_available(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<AvailableTechnicianList>>> {
    let resp = technician_service::list_available(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/technicians",
    request_body = CreateTechnicianRequest,
    responses(
        (status = 201, description = "Technician created", body = ApiResponse<CreatedTechnician>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "E-mail already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Technicians"
)]
pub async fn create_technician(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTechnicianRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedTechnician>>)> {
    let resp = technician_service::create_technician(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/technicians",
    responses(
        (status = 200, description = "All technicians", body = ApiResponse<TechnicianList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Technicians"
)]
pub async fn list_technicians(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<TechnicianList>>> {
    let resp = technician_service::list_technicians(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/technicians/{id}",
    params(("id" = Uuid, Path, description = "Technician ID")),
    responses(
        (status = 200, description = "Technician detail", body = ApiResponse<TechnicianDetail>),
        (status = 404, description = "Technician not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Technicians"
)]
pub async fn get_technician(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TechnicianDetail>>> {
    let resp = technician_service::get_technician(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/technicians/{id}",
    params(("id" = Uuid, Path, description = "Technician ID")),
    request_body = UpdateTechnicianRequest,
    responses(
        (status = 200, description = "Technician updated", body = ApiResponse<Technician>),
        (status = 404, description = "Technician not found"),
        (status = 409, description = "E-mail already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Technicians"
)]
pub async fn update_technician(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTechnicianRequest>,
) -> AppResult<Json<ApiResponse<Technician>>> {
    let resp = technician_service::update_technician(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/technicians/profile",
    request_body = UpdateTechnicianProfileRequest,
    responses(
        (status = 200, description = "Own profile updated", body = ApiResponse<Technician>),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Technicians"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateTechnicianProfileRequest>,
) -> AppResult<Json<ApiResponse<Technician>>> {
    let resp = technician_service::update_own_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/technicians/avatar",
    request_body(
        content = AvatarForm,
        content_type = "multipart/form-data",
        description = "Image in the `avatar` field"
    ),
    responses(
        (status = 200, description = "Avatar updated", body = ApiResponse<AccountInfo>),
        (status = 400, description = "Missing, oversized or non-image file")
    ),
    security(("bearer_auth" = [])),
    tag = "Technicians"
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> AppResult<Json<ApiResponse<AccountInfo>>> {
    let upload = read_avatar(mp).await?;
    let resp = technician_service::upload_technician_avatar(&state, &user, upload).await?;
    Ok(Json(resp))
}
