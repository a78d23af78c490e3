use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, EntityTrait, FromQueryResult, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::clients::{ClientList, RegisterClientRequest, UpdateClientRequest},
    entity::{
        clients::{
            ActiveModel as ClientActive, Column as ClientCol, Entity as Clients,
            Model as ClientModel,
        },
        tickets::{Column as TicketCol, Entity as Tickets},
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel, Role},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_client},
    models::{AccountInfo, Client, ClientDetail},
    response::{ApiResponse, Meta},
    services::{
        account::{self, EMAIL_TAKEN},
        auth_service::hash_password,
        ticket_service::{client_for_user, tickets_for_client},
    },
    state::AppState,
    storage::AvatarUpload,
    validation::Validate,
};

/// Public self-registration. The user row and its client profile commit together.
pub async fn register_client(
    state: &AppState,
    payload: RegisterClientRequest,
) -> AppResult<ApiResponse<Client>> {
    payload.validate()?;
    let RegisterClientRequest {
        name,
        email,
        password,
    } = payload;

    account::ensure_email_available(&state.orm, &email, None).await?;
    let password_hash = hash_password(&password)?;

    let txn = state.orm.begin().await?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(Role::Client),
        avatar_url: Set(None),
        is_first_access: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, EMAIL_TAKEN))?;

    let client = ClientActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "client_register",
        "clients",
        serde_json::json!({ "client_id": client.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Client registered",
        client_from_parts(&client, &user, None),
        Some(Meta::empty()),
    ))
}

pub async fn list_clients(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ClientList>> {
    ensure_admin(user)?;

    #[derive(Debug, FromQueryResult)]
    struct TicketCount {
        client_id: Uuid,
        count: i64,
    }

    let counts: HashMap<Uuid, u64> = Tickets::find()
        .select_only()
        .column(TicketCol::ClientId)
        .column_as(Expr::col(TicketCol::Id).count(), "count")
        .group_by(TicketCol::ClientId)
        .into_model::<TicketCount>()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| (row.client_id, row.count as u64))
        .collect();

    let items: Vec<Client> = Clients::find()
        .find_also_related(Users)
        .order_by_desc(ClientCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(client, user)| {
            let count = counts.get(&client.id).copied().unwrap_or(0);
            user.map(|u| client_from_parts(&client, &u, Some(count)))
        })
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Clients", ClientList { items }, Some(meta)))
}

pub async fn get_client(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ClientDetail>> {
    ensure_admin(user)?;
    let (client, owner) = find_client(state, id).await?;
    let tickets = tickets_for_client(&state.orm, client.id).await?;
    let count = tickets.len() as u64;

    Ok(ApiResponse::success(
        "Client",
        ClientDetail {
            client: client_from_parts(&client, &owner, Some(count)),
            tickets,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_client_by_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateClientRequest,
) -> AppResult<ApiResponse<Client>> {
    ensure_admin(user)?;
    payload.validate()?;
    let (client, owner) = find_client(state, id).await?;

    let owner = account::update_identity(&state.orm, owner, payload.name, payload.email).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "client_update",
        "clients",
        serde_json::json!({ "client_id": client.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Client updated",
        client_from_parts(&client, &owner, None),
        Some(Meta::empty()),
    ))
}

/// Removes the client's user row; the profile, its tickets and their lines cascade.
pub async fn delete_client(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let (client, owner) = find_client(state, id).await?;
    Users::delete_by_id(owner.id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "client_delete",
        "clients",
        serde_json::json!({ "client_id": client.id, "user_id": owner.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Client deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn update_own_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateClientRequest,
) -> AppResult<ApiResponse<AccountInfo>> {
    ensure_client(user)?;
    payload.validate()?;
    client_for_user(&state.orm, user.user_id).await?;

    let owner = account::find_user(&state.orm, user.user_id).await?;
    let owner = account::update_identity(&state.orm, owner, payload.name, payload.email).await?;

    Ok(ApiResponse::success(
        "Profile updated",
        account::account_info(&owner),
        Some(Meta::empty()),
    ))
}

pub async fn delete_own_account(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_client(user)?;
    let client = client_for_user(&state.orm, user.user_id).await?;
    Users::delete_by_id(user.user_id).exec(&state.orm).await?;

    tracing::info!(client_id = %client.id, "client deleted own account");

    // The user row is gone, so the entry carries no user reference.
    audit::record(
        &state.pool,
        None,
        "client_self_delete",
        "clients",
        serde_json::json!({ "client_id": client.id, "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Account deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn upload_client_avatar(
    state: &AppState,
    user: &AuthUser,
    upload: AvatarUpload,
) -> AppResult<ApiResponse<AccountInfo>> {
    ensure_client(user)?;
    let info = account::replace_avatar(state, user.user_id, upload).await?;
    Ok(ApiResponse::success("Avatar updated", info, Some(Meta::empty())))
}

async fn find_client(state: &AppState, id: Uuid) -> AppResult<(ClientModel, UserModel)> {
    let found = Clients::find_by_id(id)
        .find_also_related(Users)
        .one(&state.orm)
        .await?;
    match found {
        Some((client, Some(user))) => Ok((client, user)),
        _ => Err(AppError::not_found("Client")),
    }
}

fn client_from_parts(client: &ClientModel, user: &UserModel, tickets_count: Option<u64>) -> Client {
    Client {
        id: client.id,
        user_id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        avatar_url: user.avatar_url.clone(),
        tickets_count,
        created_at: user.created_at.with_timezone(&Utc),
    }
}
