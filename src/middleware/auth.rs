use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::Role,
    session::{token_from_headers, verify_token},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, allowed: &[Role]) -> Result<(), AppError> {
    if !allowed.contains(&user.role) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Sellers and agents may publish and manage listings.
pub fn ensure_lister(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &Role::LISTERS)
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, AppError> {
    let token = token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_token(&state.config, &token)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let role = claims.role.parse::<Role>().map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
    }
}

/// Anonymous callers, stale cookies included, extract as `None`.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match authenticate(parts, state) {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Unauthorized) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
