use axum::http::HeaderValue;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    db::DbPool,
    dto::auth::{LoginRequest, LoginResponse, LogoutResponse, SignupRequest, SignupResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{PASSWORD_PROVIDER, Role, User},
    response::ApiResponse,
    session,
    state::AppState,
    validation::{blank_to_none, normalize_email},
};

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    role: String,
    provider: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            phone: row.phone,
            role: row.role.parse()?,
            provider: row.provider,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, phone, role, provider, created_at";

pub async fn signup_user(
    state: &AppState,
    payload: SignupRequest,
) -> AppResult<ApiResponse<SignupResponse>> {
    let SignupRequest {
        email,
        password,
        name,
        role,
        phone,
    } = payload;
    let email = normalize_email(&email)?;
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let password_hash = session::hash_password(&password)?;
    let role = role.unwrap_or_default();

    let row: UserRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO users (id, email, password_hash, name, phone, role, provider)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(blank_to_none(name))
    .bind(blank_to_none(phone))
    .bind(role.as_str())
    .bind(PASSWORD_PROVIDER)
    .fetch_one(&state.pool)
    .await
    .map_err(conflict_on_unique)?;
    let user = User::try_from(row)?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::UserSignup,
        serde_json::json!({ "user_id": user.id, "role": user.role }),
    )
    .await;

    Ok(ApiResponse::ok(
        "User created",
        SignupResponse {
            user,
            requires_login: true,
        },
    ))
}

/// Verifies credentials and returns the response together with the session cookie.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<(ApiResponse<LoginResponse>, HeaderValue)> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();

    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&state.pool)
            .await?;

    let Some(row) = row else {
        return Err(AppError::InvalidCredentials);
    };
    // Seed and guest accounts may have no usable password.
    let Some(stored_hash) = row.password_hash.as_deref() else {
        return Err(AppError::InvalidCredentials);
    };
    if !session::verify_password(&password, stored_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let user = User::try_from(row)?;
    let token = session::sign_token(&state.config, user.id, &user.email, user.role)?;
    let cookie = session::auth_cookie(&state.config, &token)?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::UserLogin,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = ApiResponse::ok("Logged in", LoginResponse { user, token });
    Ok((resp, cookie))
}

pub async fn current_user(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<User>> {
    let user = find_user(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(ApiResponse::ok("Current user", user))
}

pub fn logout_user(state: &AppState) -> AppResult<(ApiResponse<LogoutResponse>, HeaderValue)> {
    let cookie = session::clear_auth_cookie(&state.config)?;
    let resp = ApiResponse::ok("Logged out", LogoutResponse { ok: true });
    Ok((resp, cookie))
}

pub async fn find_user(pool: &DbPool, id: Uuid) -> AppResult<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.map(User::try_from).transpose()
}

/// Resolve a visitor by email, creating a BUYER guest account when unknown.
///
/// Guests get a random, never-disclosed placeholder password.
pub async fn find_or_create_guest(pool: &DbPool, email: &str) -> AppResult<Uuid> {
    let email = normalize_email(email)?;
    let placeholder = session::hash_password(&Uuid::new_v4().to_string())?;

    let inserted: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role, provider)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.as_str())
    .bind(placeholder)
    .bind(Role::Buyer.as_str())
    .bind(PASSWORD_PROVIDER)
    .fetch_optional(pool)
    .await?;

    let user_id = match inserted {
        Some((id,)) => {
            tracing::info!(user_id = %id, "created guest account for visit booking");
            id
        }
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email.as_str())
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };
    Ok(user_id)
}

fn conflict_on_unique(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Email already in use".into())
        }
        _ => AppError::DbError(err),
    }
}
