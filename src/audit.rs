use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Everything that lands in `audit_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserSignup,
    UserLogin,
    ListingCreate,
    ListingUpdate,
    ListingDelete,
    VisitCreate,
    VisitUpdate,
    PhotoUpload,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserSignup => "user_signup",
            AuditAction::UserLogin => "user_login",
            AuditAction::ListingCreate => "listing_create",
            AuditAction::ListingUpdate => "listing_update",
            AuditAction::ListingDelete => "listing_delete",
            AuditAction::VisitCreate => "visit_create",
            AuditAction::VisitUpdate => "visit_update",
            AuditAction::PhotoUpload => "photo_upload",
        }
    }

    pub fn resource(&self) -> &'static str {
        match self {
            AuditAction::UserSignup | AuditAction::UserLogin => "users",
            AuditAction::ListingCreate | AuditAction::ListingUpdate | AuditAction::ListingDelete => {
                "listings"
            }
            AuditAction::VisitCreate | AuditAction::VisitUpdate => "visits",
            AuditAction::PhotoUpload => "uploads",
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Value,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit failures are logged and never fail the caller.
pub async fn record(pool: &DbPool, user_id: Option<Uuid>, action: AuditAction, metadata: Value) {
    if let Err(err) = log_audit(pool, user_id, action, metadata).await {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_map_to_their_tables() {
        assert_eq!(AuditAction::UserLogin.resource(), "users");
        assert_eq!(AuditAction::ListingDelete.as_str(), "listing_delete");
        assert_eq!(AuditAction::ListingDelete.resource(), "listings");
        assert_eq!(AuditAction::PhotoUpload.resource(), "uploads");
    }
}
