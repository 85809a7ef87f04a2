use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use housing_market_api::{
    config::AppConfig, models::Role, routes::build_app, session::sign_token, state::AppState,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

// Requests that are answered before any query runs, so no database is needed.
fn app() -> (Router, Arc<AppConfig>) {
    let config = Arc::new(AppConfig::for_tests("postgres://localhost/unused"));
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let state = AppState {
        pool,
        orm: DatabaseConnection::Disconnected,
        config: config.clone(),
    };
    (build_app(state).expect("app"), config)
}

fn bearer(config: &AppConfig, role: Role) -> String {
    let token = sign_token(config, Uuid::new_v4(), "someone@example.com", role).expect("token");
    format!("Bearer {token}")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn health_is_public_and_tagged_with_request_id() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn unknown_routes_use_the_envelope() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["data"]["path"], "/nope");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let (app, _) = app();
    for uri in ["/api/me/listings", "/api/auth/me", "/api/visits"] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn stale_cookie_is_rejected() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::get("/api/auth/me")
                .header(header::COOKIE, "auth_token=not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn buyers_cannot_create_listings() {
    let (app, config) = app();
    let payload = serde_json::json!({
        "title": "Loft",
        "description": "A loft with a view of the river",
        "price": 100000,
        "category": "SALE",
        "property_type": "APARTMENT"
    });
    let response = app
        .oneshot(
            Request::post("/api/listings")
                .header(header::AUTHORIZATION, bearer(&config, Role::Buyer))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn renters_cannot_upload() {
    let (app, config) = app();
    let boundary = "X-BOUNDARY";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
    );
    let response = app
        .oneshot(
            Request::post("/api/upload")
                .header(header::AUTHORIZATION, bearer(&config, Role::Renter))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_category_is_a_bad_request() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::get("/api/listings?category=castle")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::post("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn cors_allows_the_configured_origin_with_credentials() {
    let (app, config) = app();
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/listings")
                .header(header::ORIGIN, config.allowed_origin.as_str())
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        config.allowed_origin.as_str()
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn docs_are_served() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

async fn assert_bad_request(response: axum::response::Response) -> Value {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().starts_with("Bad Request"));
    assert!(body["data"]["error"].is_string());
    body
}

#[tokio::test]
async fn malformed_json_bodies_are_enveloped_bad_requests() {
    let (app, config) = app();

    let signup = serde_json::json!({
        "email": "x@example.com",
        "password": "hunter22",
        "role": "ADMIN"
    });
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/auth/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(signup.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = assert_bad_request(response).await;
    assert!(body["message"].as_str().unwrap().contains("Invalid input"));

    let listing = serde_json::json!({
        "title": "Loft",
        "description": "A loft with a view of the river",
        "price": 1000.5,
        "category": "CASTLE",
        "property_type": "APARTMENT"
    });
    let response = app
        .oneshot(
            Request::post("/api/listings")
                .header(header::AUTHORIZATION, bearer(&config, Role::Seller))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(listing.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_bad_request(response).await;
}

#[tokio::test]
async fn malformed_path_and_query_are_enveloped_bad_requests() {
    let (app, config) = app();

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/listings/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_bad_request(response).await;

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/listings?bedrooms=two")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_bad_request(response).await;

    let response = app
        .oneshot(
            Request::patch("/api/visits/123")
                .header(header::AUTHORIZATION, bearer(&config, Role::Buyer))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_bad_request(response).await;
}

#[tokio::test]
async fn upload_role_is_checked_before_the_body() {
    let (app, config) = app();

    // Not even multipart: a buyer still gets 403, a seller gets 400.
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/upload")
                .header(header::AUTHORIZATION, bearer(&config, Role::Buyer))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("not a form"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(
            Request::post("/api/upload")
                .header(header::AUTHORIZATION, bearer(&config, Role::Seller))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("not a form"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_bad_request(response).await;
}
