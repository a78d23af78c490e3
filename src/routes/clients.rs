use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::clients::{ClientList, RegisterClientRequest, UpdateClientRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{AccountInfo, Client, ClientDetail},
    response::ApiResponse,
    routes::upload::{AVATAR_BODY_LIMIT, AvatarForm, read_avatar},
    services::client_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/", get(list_clients))
        .route("/profile", patch(update_profile))
        .route("/account", delete(delete_account))
        .route(
            "/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route(
            "/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

#[utoipa::path(
    post,
    path = "/api/clients/register",
    request_body = RegisterClientRequest,
    responses(
        (status = 201, description = "Client registered", body = ApiResponse<Client>),
        (status = 409, description = "E-mail already in use"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Clients"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterClientRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Client>>)> {
    let resp = client_service::register_client(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/clients",
    responses(
        (status = 200, description = "Clients with counts", body = ApiResponse<ClientList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ClientList>>> {
    let resp = client_service::list_clients(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client with its tickets", body = ApiResponse<ClientDetail>),
        (status = 404, description = "Client not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn get_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ClientDetail>>> {
    let resp = client_service::get_client(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ApiResponse<Client>),
        (status = 404, description = "Client not found"),
        (status = 409, description = "E-mail already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn update_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> AppResult<Json<ApiResponse<Client>>> {
    let resp = client_service::update_client_by_admin(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client and its tickets deleted"),
        (status = 404, description = "Client not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn delete_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = client_service::delete_client(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/clients/profile",
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Own profile updated", body = ApiResponse<AccountInfo>),
        (status = 409, description = "E-mail already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateClientRequest>,
) -> AppResult<Json<ApiResponse<AccountInfo>>> {
    let resp = client_service::update_own_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/clients/account",
    responses(
        (status = 200, description = "Own account deleted"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = client_service::delete_own_account(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/clients/avatar",
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
    tag = "Clients"
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> AppResult<Json<ApiResponse<AccountInfo>>> {
    let upload = read_avatar(mp).await?;
    let resp = client_service::upload_client_avatar(&state, &user, upload).await?;
    Ok(Json(resp))
}
