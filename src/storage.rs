use std::path::Path;

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// URL prefix the upload folder is served under.
pub const UPLOADS_PREFIX: &str = "/uploads/";

#[derive(Debug)]
pub struct AvatarUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Writes the image under a random name and returns its public URL.
pub async fn save_avatar(dir: &Path, max_size: usize, upload: &AvatarUpload) -> AppResult<String> {
    let ext = ext_from_mime(&upload.content_type).ok_or_else(|| {
        AppError::BadRequest("Invalid file type, only images are allowed".into())
    })?;
    if upload.bytes.is_empty() {
        return Err(AppError::BadRequest("No file uploaded".into()));
    }
    if upload.bytes.len() > max_size {
        return Err(AppError::BadRequest(format!(
            "File exceeds the maximum size of {max_size} bytes"
        )));
    }

    let file_name = format!("{}.{}", Uuid::new_v4().simple(), ext);
    fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("create upload dir: {e}")))?;
    fs::write(dir.join(&file_name), &upload.bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("write avatar {file_name}: {e}")))?;

    Ok(format!("{UPLOADS_PREFIX}{file_name}"))
}

/// Best-effort removal of a file previously returned by [`save_avatar`].
pub async fn remove_avatar(dir: &Path, url: &str) {
    let Some(file_name) = url.strip_prefix(UPLOADS_PREFIX) else {
        return;
    };
    if file_name.contains('/') || file_name.contains("..") {
        return;
    }
    if let Err(err) = fs::remove_file(dir.join(file_name)).await {
        tracing::warn!(error = %err, file = file_name, "failed to remove old avatar");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("helpdesk-uploads-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/pdf"), None);
    }

    #[tokio::test]
    async fn saves_and_removes_avatar() {
        let dir = temp_dir();
        let upload = AvatarUpload {
            content_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        let url = save_avatar(&dir, 1024, &upload).await.expect("save");
        assert!(url.starts_with(UPLOADS_PREFIX));
        assert!(url.ends_with(".png"));

        let path = dir.join(url.trim_start_matches(UPLOADS_PREFIX));
        assert!(path.exists());

        remove_avatar(&dir, &url).await;
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rejects_non_images_and_oversized_files() {
        let dir = temp_dir();
        let pdf = AvatarUpload {
            content_type: "application/pdf".into(),
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(
            save_avatar(&dir, 1024, &pdf).await,
            Err(AppError::BadRequest(_))
        ));

        let big = AvatarUpload {
            content_type: "image/jpeg".into(),
            bytes: vec![0; 2048],
        };
        assert!(matches!(
            save_avatar(&dir, 1024, &big).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
