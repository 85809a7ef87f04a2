use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::visits::{CreateVisitRequest, UpdateVisitRequest, VisitList},
    error::AppResult,
    middleware::{
        auth::AuthUser,
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    models::Visit,
    response::ApiResponse,
    routes::params::VisitListQuery,
    services::visit_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_visits).post(create_visit))
        .route("/{id}", patch(update_visit))
}

#[utoipa::path(
    post,
    path = "/api/visits",
    request_body = CreateVisitRequest,
    responses(
        (status = 201, description = "Visit requested", body = ApiResponse<Visit>),
        (status = 400, description = "No visitor could be resolved"),
        (status = 404, description = "Listing not found")
    ),
    tag = "Visits"
)]
pub async fn create_visit(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ApiJson(payload): ApiJson<CreateVisitRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Visit>>)> {
    let resp = visit_service::create_visit(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/visits",
    params(VisitListQuery),
    responses(
        (status = 200, description = "Visits visible to the caller", body = ApiResponse<VisitList>),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []), ("cookie_auth" = [])),
    tag = "Visits"
)]
pub async fn list_visits(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<VisitListQuery>,
) -> AppResult<Json<ApiResponse<VisitList>>> {
    let resp = visit_service::list_visits(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/visits/{id}",
    params(
        ("id" = Uuid, Path, description = "Visit ID")
    ),
    request_body = UpdateVisitRequest,
    responses(
        (status = 200, description = "Updated visit", body = ApiResponse<Visit>),
        (status = 403, description = "Neither the visitor nor the listing owner"),
        (status = 404, description = "Visit not found")
    ),
    security(("bearer_auth" = []), ("cookie_auth" = [])),
    tag = "Visits"
)]
pub async fn update_visit(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateVisitRequest>,
) -> AppResult<Json<ApiResponse<Visit>>> {
    let resp = visit_service::update_visit(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
