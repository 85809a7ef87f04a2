use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::post,
};

use crate::{
    dto::uploads::{UploadForm, UploadResponse},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_lister},
    response::ApiResponse,
    services::upload_service,
    state::AppState,
};

const FILE_FIELD: &str = "file";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored file URL", body = ApiResponse<UploadResponse>),
        (status = 400, description = "No file"),
        (status = 403, description = "Only sellers and agents may upload")
    ),
    security(("bearer_auth" = []), ("cookie_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<UploadResponse>>> {
    // Reject before any of the body is read.
    ensure_lister(&user)?;
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let resp =
            upload_service::store_upload(&state, &user, file_name.as_deref(), &bytes).await?;
        return Ok(Json(resp));
    }

    Err(AppError::BadRequest("No file".into()))
}
