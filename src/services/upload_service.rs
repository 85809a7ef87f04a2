use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    config::AppConfig,
    dto::uploads::UploadResponse,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_lister},
    response::ApiResponse,
    state::AppState,
};

const DEFAULT_EXTENSION: &str = ".jpg";

/// Store an uploaded listing photo and return its public URL.
pub async fn store_upload(
    state: &AppState,
    user: &AuthUser,
    original_name: Option<&str>,
    bytes: &[u8],
) -> AppResult<ApiResponse<UploadResponse>> {
    ensure_lister(user)?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("No file".into()));
    }

    let file_name = stored_file_name(original_name);
    let dir = PathBuf::from(&state.config.upload_dir);
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    fs::write(dir.join(&file_name), bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::debug!(file = %file_name, size = bytes.len(), "stored upload");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::PhotoUpload,
        serde_json::json!({ "file": file_name, "size": bytes.len() }),
    )
    .await;

    let url = public_url(&state.config, &file_name);
    Ok(ApiResponse::ok("Uploaded", UploadResponse { url }))
}

/// `<millis>-<random><ext>`; the client name only contributes a sane extension.
pub fn stored_file_name(original_name: Option<&str>) -> String {
    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{}{}", Utc::now().timestamp_millis(), &random[..10], extension)
}

pub fn public_url(config: &AppConfig, file_name: &str) -> String {
    format!("{}/uploads/{}", config.public_base, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_safe_extensions_only() {
        assert!(stored_file_name(Some("house.PNG")).ends_with(".png"));
        assert!(stored_file_name(Some("../../etc/passwd")).ends_with(".jpg"));
        assert!(stored_file_name(Some("photo.j$g")).ends_with(".jpg"));
        assert!(stored_file_name(None).ends_with(".jpg"));
    }

    #[test]
    fn names_do_not_collide() {
        assert_ne!(stored_file_name(Some("a.jpg")), stored_file_name(Some("a.jpg")));
    }

    #[test]
    fn url_is_served_under_uploads() {
        let config = AppConfig::for_tests("postgres://localhost/unused");
        assert_eq!(
            public_url(&config, "1-abc.jpg"),
            "http://localhost:4000/uploads/1-abc.jpg"
        );
    }
}
