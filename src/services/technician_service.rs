use chrono::Utc;
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    dto::technicians::{
        AvailableTechnicianList, CreateTechnicianRequest, TechnicianList,
        UpdateTechnicianProfileRequest, UpdateTechnicianRequest,
    },
    entity::{
        technicians::{
            ActiveModel as TechnicianActive, Column as TechCol, Entity as Technicians,
            Model as TechnicianModel,
        },
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel, Role},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_technician},
    models::{AccountInfo, AvailableTechnician, CreatedTechnician, Technician, TechnicianDetail},
    response::{ApiResponse, Meta},
    services::{
        account::{self, EMAIL_TAKEN},
        auth_service::hash_password,
        ticket_service::{technician_for_user, tickets_for_technician},
    },
    state::AppState,
    storage::AvatarUpload,
    validation::Validate,
};

/// Slots a technician gets when the admin does not pick any.
pub const DEFAULT_AVAILABLE_HOURS: [&str; 8] = [
    "08:00", "09:00", "10:00", "11:00", "14:00", "15:00", "16:00", "17:00",
];

const TEMP_PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789@#$%";
const TEMP_PASSWORD_LEN: usize = 8;

pub fn generate_temporary_password(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
        .into_iter()
        .map(|b| TEMP_PASSWORD_CHARSET[b as usize % TEMP_PASSWORD_CHARSET.len()] as char)
        .collect()
}

pub fn default_available_hours() -> Vec<String> {
    DEFAULT_AVAILABLE_HOURS.iter().map(|h| h.to_string()).collect()
}

/// Admin-only. The account starts in first-access mode and the generated
/// password is returned exactly once.
pub async fn create_technician(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTechnicianRequest,
) -> AppResult<ApiResponse<CreatedTechnician>> {
    ensure_admin(user)?;
    payload.validate()?;
    let CreateTechnicianRequest {
        name,
        email,
        available_hours,
    } = payload;

    account::ensure_email_available(&state.orm, &email, None).await?;

    let temporary_password = generate_temporary_password(TEMP_PASSWORD_LEN);
    let password_hash = hash_password(&temporary_password)?;
    let hours = match available_hours {
        Some(hours) if !hours.is_empty() => hours,
        _ => default_available_hours(),
    };

    let txn = state.orm.begin().await?;
    let owner = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(Role::Technician),
        avatar_url: Set(None),
        is_first_access: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, EMAIL_TAKEN))?;

    let technician = TechnicianActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.id),
        available_hours: Set(hours),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "technician_create",
        "technicians",
        serde_json::json!({ "technician_id": technician.id }),
    )
    .await;
    tracing::info!(technician_id = %technician.id, "technician account created");

    Ok(ApiResponse::success(
        "Technician created",
        CreatedTechnician {
            technician: technician_from_parts(&technician, &owner),
            temporary_password,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_technicians(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<TechnicianList>> {
    ensure_admin(user)?;
    let items: Vec<Technician> = Technicians::find()
        .find_also_related(Users)
        .order_by_desc(TechCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(technician, owner)| owner.map(|u| technician_from_parts(&technician, &u)))
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Technicians", TechnicianList { items }, Some(meta)))
}

pub async fn get_technician(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<TechnicianDetail>> {
    ensure_admin(user)?;
    let (technician, owner) = find_technician(state, id).await?;
    let tickets = tickets_for_technician(&state.orm, technician.id).await?;

    Ok(ApiResponse::success(
        "Technician",
        TechnicianDetail {
            technician: technician_from_parts(&technician, &owner),
            tickets,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_technician(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTechnicianRequest,
) -> AppResult<ApiResponse<Technician>> {
    ensure_admin(user)?;
    payload.validate()?;
    let (technician, owner) = find_technician(state, id).await?;

    let txn = state.orm.begin().await?;
    let owner = account::update_identity(&txn, owner, payload.name, payload.email).await?;
    let technician = apply_hours(&txn, technician, payload.available_hours).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "technician_update",
        "technicians",
        serde_json::json!({ "technician_id": technician.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Technician updated",
        technician_from_parts(&technician, &owner),
        Some(Meta::empty()),
    ))
}

pub async fn update_own_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateTechnicianProfileRequest,
) -> AppResult<ApiResponse<Technician>> {
    ensure_technician(user)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let technician = technician_for_user(&txn, user.user_id).await?;
    let owner = account::find_user(&txn, user.user_id).await?;
    let owner = account::update_identity(&txn, owner, payload.name, None).await?;
    let technician = apply_hours(&txn, technician, payload.available_hours).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Profile updated",
        technician_from_parts(&technician, &owner),
        Some(Meta::empty()),
    ))
}

pub async fn upload_technician_avatar(
    state: &AppState,
    user: &AuthUser,
    upload: AvatarUpload,
) -> AppResult<ApiResponse<AccountInfo>> {
    ensure_technician(user)?;
    let info = account::replace_avatar(state, user.user_id, upload).await?;
    Ok(ApiResponse::success("Avatar updated", info, Some(Meta::empty())))
}

/// Public directory used by clients when opening a ticket.
pub async fn list_available(state: &AppState) -> AppResult<ApiResponse<AvailableTechnicianList>> {
    let mut items: Vec<AvailableTechnician> = Technicians::find()
        .find_also_related(Users)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(technician, owner)| {
            owner.map(|u| AvailableTechnician {
                id: technician.id,
                name: u.name,
                avatar_url: u.avatar_url,
                available_hours: technician.available_hours,
            })
        })
        .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success(
        "Available technicians",
        AvailableTechnicianList { items },
        Some(meta),
    ))
}

async fn apply_hours<C: sea_orm::ConnectionTrait>(
    conn: &C,
    technician: TechnicianModel,
    hours: Option<Vec<String>>,
) -> AppResult<TechnicianModel> {
    let Some(hours) = hours else {
        return Ok(technician);
    };
    let mut active: TechnicianActive = technician.into();
    active.available_hours = Set(hours);
    Ok(active.update(conn).await?)
}

async fn find_technician(state: &AppState, id: Uuid) -> AppResult<(TechnicianModel, UserModel)> {
    let found = Technicians::find_by_id(id)
        .find_also_related(Users)
        .one(&state.orm)
        .await?;
    match found {
        Some((technician, Some(owner))) => Ok((technician, owner)),
        _ => Err(AppError::not_found("Technician")),
    }
}

fn technician_from_parts(technician: &TechnicianModel, owner: &UserModel) -> Technician {
    Technician {
        id: technician.id,
        user_id: owner.id,
        name: owner.name.clone(),
        email: owner.email.clone(),
        avatar_url: owner.avatar_url.clone(),
        is_first_access: owner.is_first_access,
        available_hours: technician.available_hours.clone(),
        created_at: technician.created_at.with_timezone(&Utc),
    }
}
