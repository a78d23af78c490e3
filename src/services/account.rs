//! User-row helpers shared by the client and technician services.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    entity::users::{
        ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel,
    },
    error::{AppError, AppResult},
    models::AccountInfo,
    state::AppState,
    storage::{self, AvatarUpload},
};

pub const EMAIL_TAKEN: &str = "A user with this e-mail already exists";

/// Fails with `Conflict` when another user already owns `email`.
pub async fn ensure_email_available<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let existing = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(conn)
        .await?;
    match existing {
        Some(user) if Some(user.id) != except => Err(AppError::Conflict(EMAIL_TAKEN.into())),
        _ => Ok(()),
    }
}

pub async fn find_user<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

/// Applies optional name/e-mail changes; returns the row unchanged when both are absent.
pub async fn update_identity<C: ConnectionTrait>(
    conn: &C,
    user: UserModel,
    name: Option<String>,
    email: Option<String>,
) -> AppResult<UserModel> {
    if name.is_none() && email.is_none() {
        return Ok(user);
    }
    if let Some(email) = email.as_ref().filter(|e| **e != user.email) {
        ensure_email_available(conn, email, Some(user.id)).await?;
    }

    let mut active: UserActive = user.into();
    if let Some(name) = name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    active.updated_at = Set(Utc::now().into());
    active
        .update(conn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, EMAIL_TAKEN))
}

/// Stores the uploaded image, points the user at it and drops the previous file.
pub async fn replace_avatar(
    state: &AppState,
    user_id: Uuid,
    upload: AvatarUpload,
) -> AppResult<AccountInfo> {
    let user = find_user(&state.orm, user_id).await?;
    let url = storage::save_avatar(&state.config.upload_folder, state.config.max_file_size, &upload)
        .await?;

    let previous = user.avatar_url.clone();
    let mut active: UserActive = user.into();
    active.avatar_url = Set(Some(url));
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    if let Some(previous) = previous {
        storage::remove_avatar(&state.config.upload_folder, &previous).await;
    }

    Ok(account_info(&user))
}

pub fn account_info(user: &UserModel) -> AccountInfo {
    AccountInfo {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        avatar_url: user.avatar_url.clone(),
    }
}
