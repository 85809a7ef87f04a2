use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Visit, VisitStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVisitRequest {
    /// Book on behalf of an existing user
    pub user_id: Option<Uuid>,
    /// Used when the caller is anonymous; unknown addresses get a guest account
    pub user_email: Option<String>,
    pub listing_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateVisitRequest {
    pub status: Option<VisitStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// An empty string clears the notes
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct VisitList {
    #[schema(value_type = Vec<Visit>)]
    pub items: Vec<Visit>,
}
