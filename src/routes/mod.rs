use std::time::Duration;

use anyhow::Context;
use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method, Request, Response, StatusCode, Uri, header},
    routing::get,
};
use tower::{Layer, limit::ConcurrencyLimitLayer};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    response::ApiResponse,
    state::AppState,
};

pub mod auth;
pub mod doc;
pub mod health;
pub mod listings;
pub mod params;
pub mod uploads;
pub mod visits;

const REQUEST_ID_HEADER: &str = "x-request-id";
const UPLOAD_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/listings", listings::router())
        .nest("/me", listings::me_router())
        .nest("/map", listings::map_router())
        .nest("/amenities", listings::amenities_router())
        .nest("/visits", visits::router())
        .nest("/upload", uploads::router(max_upload_bytes + MULTIPART_OVERHEAD))
}

/// The full application: API, docs, uploaded files and the middleware stack.
pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let config = state.config.clone();
    let origin = HeaderValue::from_str(&config.allowed_origin)
        .with_context(|| format!("invalid ALLOWED_ORIGIN {}", config.allowed_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let uploads = SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static(UPLOAD_CACHE_CONTROL),
    )
    .layer(ServeDir::new(&config.upload_dir));

    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(|_request: &Request<_>, _span: &tracing::Span| {
            tracing::debug!("request started");
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router(config.max_upload_bytes))
        .nest_service("/uploads", uploads)
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(cors)
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(
            config.max_upload_bytes + MULTIPART_OVERHEAD,
        ))
        .layer(ConcurrencyLimitLayer::new(100))
        .with_state(state);

    Ok(app)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::ok("Not Found", serde_json::json!({ "path": uri.path() }));
    (StatusCode::NOT_FOUND, Json(body))
}
