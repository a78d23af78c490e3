use axum::extract::Multipart;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    storage::AvatarUpload,
};

/// Transport ceiling for avatar requests; the configured file size is enforced on save.
pub const AVATAR_BODY_LIMIT: usize = 10 * 1024 * 1024;

const AVATAR_FIELD: &str = "avatar";

/// Documents the multipart form accepted by the avatar routes.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct AvatarForm {
    #[schema(value_type = String, format = Binary)]
    avatar: Vec<u8>,
}

/// Pulls the `avatar` part out of a multipart body.
pub async fn read_avatar(mut mp: Multipart) -> AppResult<AvatarUpload> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        return Ok(AvatarUpload {
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::BadRequest("No file uploaded".into()))
}
