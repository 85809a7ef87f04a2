use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, LogoutResponse, SignupRequest, SignupResponse},
    error::AppResult,
    middleware::{auth::AuthUser, extract::ApiJson},
    models::User,
    response::ApiResponse,
    services::auth_service::{current_user, login_user, logout_user, signup_user},
    state::AppState,
};

type WithCookie<T> = ([(header::HeaderName, HeaderValue); 1], Json<ApiResponse<T>>);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<SignupResponse>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SignupResponse>>)> {
    let resp = signup_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user and set the auth_token cookie", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<WithCookie<LoginResponse>> {
    let (resp, cookie) = login_user(&state, payload).await?;
    Ok(([(header::SET_COOKIE, cookie)], Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Clear the auth_token cookie", body = ApiResponse<LogoutResponse>)
    ),
    tag = "Auth"
)]
pub async fn logout(State(state): State<AppState>) -> AppResult<WithCookie<LogoutResponse>> {
    let (resp, cookie) = logout_user(&state)?;
    Ok(([(header::SET_COOKIE, cookie)], Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []), ("cookie_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = current_user(&state, &user).await?;
    Ok(Json(resp))
}
