use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::visits::{CreateVisitRequest, UpdateVisitRequest, VisitList},
    entity::{
        listings::{Column as ListingCol, Entity as Listings, Model as ListingModel},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
        visits::{ActiveModel as VisitActive, Column as VisitCol, Entity as Visits, Model as VisitModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, Visit, VisitListing, VisitStatus, VisitUser},
    response::ApiResponse,
    routes::params::VisitListQuery,
    services::auth_service::find_or_create_guest,
    state::AppState,
    validation::blank_to_none,
};

/// Book a viewing. The visitor is, in order of preference: the explicit
/// `user_id`, the signed-in caller, or the account behind `user_email`.
pub async fn create_visit(
    state: &AppState,
    caller: Option<&AuthUser>,
    payload: CreateVisitRequest,
) -> AppResult<ApiResponse<Visit>> {
    let listing_exists = Listings::find_by_id(payload.listing_id)
        .one(&state.orm)
        .await?
        .is_some();
    if !listing_exists {
        return Err(AppError::NotFound);
    }

    let user_id = match (payload.user_id, caller, payload.user_email.as_deref()) {
        (Some(user_id), _, _) => {
            let exists = Users::find_by_id(user_id).one(&state.orm).await?.is_some();
            if !exists {
                return Err(AppError::BadRequest("user_id does not exist".into()));
            }
            user_id
        }
        (None, Some(caller), _) => caller.user_id,
        (None, None, Some(email)) => find_or_create_guest(&state.pool, email).await?,
        (None, None, None) => {
            return Err(AppError::BadRequest("user_id or user_email required".into()));
        }
    };

    let visit = VisitActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        listing_id: Set(payload.listing_id),
        scheduled_at: Set(payload.scheduled_at.into()),
        status: Set(VisitStatus::Requested.as_str().to_string()),
        notes: Set(blank_to_none(payload.notes)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        caller.map(|c| c.user_id).or(Some(user_id)),
        AuditAction::VisitCreate,
        serde_json::json!({ "visit_id": visit.id, "listing_id": visit.listing_id }),
    )
    .await;

    let visit = load_one(&state.orm, visit).await?;
    Ok(ApiResponse::ok("Visit requested", visit))
}

/// Buyers and renters see their own visits; sellers and agents also see
/// visits booked on listings they own.
pub fn visibility_condition(user: &AuthUser) -> Condition {
    let own = VisitCol::UserId.eq(user.user_id);
    if !Role::LISTERS.contains(&user.role) {
        return Condition::all().add(own);
    }

    let owned_listings = Query::select()
        .column(ListingCol::Id)
        .from(Listings)
        .and_where(Expr::col(ListingCol::CreatedById).eq(user.user_id))
        .to_owned();
    Condition::any()
        .add(own)
        .add(VisitCol::ListingId.in_subquery(owned_listings))
}

pub async fn list_visits(
    state: &AppState,
    user: &AuthUser,
    query: VisitListQuery,
) -> AppResult<ApiResponse<VisitList>> {
    let pagination = query.pagination();
    let mut condition = Condition::all().add(visibility_condition(user));

    if let Some(user_id) = query.user_id {
        condition = condition.add(VisitCol::UserId.eq(user_id));
    }
    if let Some(listing_id) = query.listing_id {
        condition = condition.add(VisitCol::ListingId.eq(listing_id));
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.trim().is_empty()) {
        let status: VisitStatus = status.parse()?;
        condition = condition.add(VisitCol::Status.eq(status.as_str()));
    }
    if let Some(from) = query.from {
        condition = condition.add(VisitCol::ScheduledAt.gte(from));
    }
    if let Some(to) = query.to {
        condition = condition.add(VisitCol::ScheduledAt.lte(to));
    }

    let finder = Visits::find()
        .filter(condition)
        .order_by_asc(VisitCol::ScheduledAt);

    let total = finder.clone().count(&state.orm).await?;
    let models = finder
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&state.orm)
        .await?;

    let items = load_visits(&state.orm, models).await?;
    Ok(ApiResponse::page("Visits", VisitList { items }, &pagination, total))
}

/// Only the visitor or the owner of the visited listing may change a visit.
pub async fn update_visit(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateVisitRequest,
) -> AppResult<ApiResponse<Visit>> {
    let existing = Visits::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.user_id != user.user_id {
        let owns_listing = Listings::find_by_id(existing.listing_id)
            .one(&state.orm)
            .await?
            .is_some_and(|listing| listing.created_by_id == user.user_id);
        if !owns_listing {
            return Err(AppError::Forbidden);
        }
    }

    let mut active: VisitActive = existing.into();
    if let Some(status) = payload.status {
        active.status = Set(status.as_str().to_string());
    }
    if let Some(scheduled_at) = payload.scheduled_at {
        active.scheduled_at = Set(scheduled_at.into());
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(blank_to_none(Some(notes)));
    }
    active.updated_at = Set(Utc::now().into());
    let visit = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::VisitUpdate,
        serde_json::json!({ "visit_id": visit.id, "status": visit.status }),
    )
    .await;

    let visit = load_one(&state.orm, visit).await?;
    Ok(ApiResponse::ok("Visit updated", visit))
}

async fn load_one<C>(db: &C, model: VisitModel) -> AppResult<Visit>
where
    C: ConnectionTrait,
{
    load_visits(db, vec![model])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

async fn load_visits<C>(db: &C, models: Vec<VisitModel>) -> AppResult<Vec<Visit>>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let user_ids: Vec<Uuid> = models.iter().map(|m| m.user_id).collect();
    let listing_ids: Vec<Uuid> = models.iter().map(|m| m.listing_id).collect();

    let users: HashMap<Uuid, UserModel> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
    let listings: HashMap<Uuid, ListingModel> = Listings::find()
        .filter(ListingCol::Id.is_in(listing_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|listing| (listing.id, listing))
        .collect();

    models
        .into_iter()
        .map(|model| {
            let user = users.get(&model.user_id).map(|u| VisitUser {
                id: u.id,
                email: u.email.clone(),
                name: u.name.clone(),
            });
            let listing = listings.get(&model.listing_id).map(|l| VisitListing {
                id: l.id,
                title: l.title.clone(),
                city: l.city.clone(),
            });
            visit_from_entity(model, user, listing)
        })
        .collect()
}

fn visit_from_entity(
    model: VisitModel,
    user: Option<VisitUser>,
    listing: Option<VisitListing>,
) -> AppResult<Visit> {
    Ok(Visit {
        id: model.id,
        user_id: model.user_id,
        listing_id: model.listing_id,
        scheduled_at: model.scheduled_at.with_timezone(&Utc),
        status: model.status.parse()?,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        user,
        listing,
    })
}
