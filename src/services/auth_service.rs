use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{ChangePasswordRequest, Claims, LoginRequest, LoginResponse},
    entity::{
        clients::{Column as ClientCol, Entity as Clients},
        technicians::{Column as TechCol, Entity as Technicians},
        users::{
            ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel,
            Role,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ClientRef, TechnicianRef, UserProfile, UserSummary},
    response::{ApiResponse, Meta},
    state::AppState,
    validation::Validate,
};

pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    expires_hours: i64,
) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(expires_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    payload.validate()?;
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = issue_token(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expires_hours,
    )?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    tracing::info!(user_id = %user.id, role = ?user.role, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            user: user_summary(&user),
            token,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let technician = match model.role {
        Role::Technician => Technicians::find()
            .filter(TechCol::UserId.eq(model.id))
            .one(&state.orm)
            .await?
            .map(|t| TechnicianRef {
                id: t.id,
                available_hours: t.available_hours,
            }),
        _ => None,
    };
    let client = match model.role {
        Role::Client => Clients::find()
            .filter(ClientCol::UserId.eq(model.id))
            .one(&state.orm)
            .await?
            .map(|c| ClientRef { id: c.id }),
        _ => None,
    };

    Ok(ApiResponse::success(
        "Profile",
        UserProfile {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            avatar_url: model.avatar_url,
            is_first_access: model.is_first_access,
            created_at: model.created_at.with_timezone(&Utc),
            technician,
            client,
        },
        Some(Meta::empty()),
    ))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if !verify_password(&payload.current_password, &existing.password_hash)? {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    let mut active: UserActive = existing.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.is_first_access = Set(false);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "password_change",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password changed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn user_summary(model: &UserModel) -> UserSummary {
    UserSummary {
        id: model.id,
        name: model.name.clone(),
        email: model.email.clone(),
        role: model.role,
        avatar_url: model.avatar_url.clone(),
        is_first_access: model.is_first_access,
    }
}
