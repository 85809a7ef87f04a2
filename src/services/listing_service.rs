use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::listings::{
        CreateListingRequest, DeletedListing, ListingList, ListingSummaryList, MapPointList,
        PhotoInput, UpdateListingRequest,
    },
    entity::{
        amenities::Entity as Amenities,
        listing_amenities::{Column as LinkCol, Entity as ListingAmenities},
        listing_photos::{
            ActiveModel as PhotoActive, Column as PhotoCol, Entity as ListingPhotos,
            Model as PhotoModel,
        },
        listings::{ActiveModel, Column, Entity as Listings, Model as ListingModel},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
        visits::{Column as VisitCol, Entity as Visits},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_lister},
    models::{
        Amenity, Listing, ListingCategory, ListingOwner, ListingPhoto, ListingSummary, MapPoint,
        PropertyType,
    },
    response::ApiResponse,
    routes::params::{ListingQuery, MapQuery, PageQuery},
    services::amenity_service::{amenity_from_entity, normalize_codes, replace_listing_amenities},
    state::AppState,
    validation::{
        blank_to_none, currency_code, http_url, in_range, min_chars, non_negative,
        positive_price,
    },
};

pub const MAP_POINT_LIMIT: u64 = 300;
const DEFAULT_CURRENCY: &str = "USD";

pub async fn create_listing(
    state: &AppState,
    user: &AuthUser,
    payload: CreateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    ensure_lister(user)?;

    min_chars("title", &payload.title, 3)?;
    min_chars("description", &payload.description, 10)?;
    positive_price(payload.price)?;
    validate_details(
        payload.bedrooms,
        payload.bathrooms,
        payload.area_sqft,
        payload.year_built,
    )?;
    validate_coordinates(payload.latitude, payload.longitude)?;
    let currency = match payload.currency.as_deref() {
        Some(raw) => currency_code(raw)?,
        None => DEFAULT_CURRENCY.to_string(),
    };
    let photos = validate_photos(payload.photos)?;
    let amenity_codes = normalize_codes(&payload.amenities)?;

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        price: Set(payload.price),
        currency: Set(currency),
        category: Set(payload.category.as_str().to_string()),
        property_type: Set(payload.property_type.as_str().to_string()),
        bedrooms: Set(payload.bedrooms),
        bathrooms: Set(payload.bathrooms),
        area_sqft: Set(payload.area_sqft),
        year_built: Set(payload.year_built),
        address_line1: Set(blank_to_none(payload.address_line1)),
        address_line2: Set(blank_to_none(payload.address_line2)),
        city: Set(blank_to_none(payload.city)),
        state: Set(blank_to_none(payload.state)),
        postal_code: Set(blank_to_none(payload.postal_code)),
        country: Set(blank_to_none(payload.country)),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        is_active: Set(true),
        created_by_id: Set(user.user_id),
        created_at: NotSet,
        updated_at: NotSet,
    };

    let txn = state.orm.begin().await?;
    let listing = active.insert(&txn).await?;
    replace_photos(&txn, listing.id, photos).await?;
    replace_listing_amenities(&txn, listing.id, &amenity_codes).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ListingCreate,
        serde_json::json!({ "listing_id": listing.id }),
    )
    .await;

    let listing = load_one(&state.orm, listing).await?;
    Ok(ApiResponse::ok("Listing created", listing))
}

pub async fn get_listing(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Listing>> {
    let model = Listings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let listing = load_one(&state.orm, model).await?;
    Ok(ApiResponse::ok("Listing", listing))
}

/// Filters for the public search. Inactive listings are never returned.
pub fn search_condition(query: &ListingQuery) -> AppResult<Condition> {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(q) = non_blank(&query.q) {
        condition = condition.add(Expr::col(Column::Title).ilike(contains_pattern(q)));
    }
    if let Some(city) = non_blank(&query.city) {
        condition = condition.add(Expr::col(Column::City).ilike(contains_pattern(city)));
    }
    if let Some(state) = non_blank(&query.state) {
        condition = condition.add(Expr::col(Column::State).ilike(contains_pattern(state)));
    }
    if let Some(category) = non_blank(&query.category) {
        let category: ListingCategory = category.parse()?;
        condition = condition.add(Column::Category.eq(category.as_str()));
    }
    if let Some(property_type) = non_blank(&query.property_type) {
        let property_type: PropertyType = property_type.parse()?;
        condition = condition.add(Column::PropertyType.eq(property_type.as_str()));
    }
    if let Some(bedrooms) = query.bedrooms.filter(|b| *b > 0) {
        condition = condition.add(Column::Bedrooms.gte(bedrooms));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    Ok(condition)
}

pub async fn search_listings(
    state: &AppState,
    query: ListingQuery,
) -> AppResult<ApiResponse<ListingSummaryList>> {
    let pagination = query.pagination();
    let condition = search_condition(&query)?;

    let finder = Listings::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await?;

    let models = finder
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let covers: HashMap<Uuid, String> = if ids.is_empty() {
        HashMap::new()
    } else {
        ListingPhotos::find()
            .filter(PhotoCol::ListingId.is_in(ids))
            .filter(PhotoCol::Position.eq(0))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|photo| (photo.listing_id, photo.url))
            .collect()
    };

    let items = models
        .into_iter()
        .map(|model| {
            let cover = covers.get(&model.id).cloned();
            summary_from_entity(model, cover)
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::page("Listings", ListingSummaryList { items }, &pagination, total))
}

pub async fn map_points(state: &AppState, query: MapQuery) -> AppResult<ApiResponse<MapPointList>> {
    let mut condition = Condition::all()
        .add(Column::IsActive.eq(true))
        .add(Column::Latitude.is_not_null())
        .add(Column::Longitude.is_not_null());

    // The box only applies when all four corners are given.
    if let (Some(swlat), Some(swlng), Some(nelat), Some(nelng)) =
        (query.swlat, query.swlng, query.nelat, query.nelng)
    {
        condition = condition
            .add(Column::Latitude.between(swlat, nelat))
            .add(Column::Longitude.between(swlng, nelng));
    }
    if let Some(category) = non_blank(&query.category) {
        let category: ListingCategory = category.parse()?;
        condition = condition.add(Column::Category.eq(category.as_str()));
    }

    let items = Listings::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .limit(MAP_POINT_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|model| match (model.latitude, model.longitude) {
            (Some(latitude), Some(longitude)) => Some(MapPoint {
                id: model.id,
                latitude,
                longitude,
                price: model.price,
                currency: model.currency,
            }),
            _ => None,
        })
        .collect();

    Ok(ApiResponse::ok("Map points", MapPointList { items }))
}

pub async fn my_listings(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<ListingList>> {
    ensure_lister(user)?;
    let pagination = query.pagination();

    let finder = Listings::find()
        .filter(Column::CreatedById.eq(user.user_id))
        .order_by_desc(Column::UpdatedAt);

    let total = finder.clone().count(&state.orm).await?;
    let models = finder
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&state.orm)
        .await?;

    let items = load_listings(&state.orm, models).await?;
    Ok(ApiResponse::page("My listings", ListingList { items }, &pagination, total))
}

pub async fn update_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    ensure_lister(user)?;

    let txn = state.orm.begin().await?;
    let existing = Listings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.created_by_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    // Ownership is settled before the payload is judged.
    if let Some(title) = &payload.title {
        min_chars("title", title, 3)?;
    }
    if let Some(description) = &payload.description {
        min_chars("description", description, 10)?;
    }
    if let Some(price) = payload.price {
        positive_price(price)?;
    }
    validate_details(
        payload.bedrooms.flatten(),
        payload.bathrooms.flatten(),
        payload.area_sqft.flatten(),
        payload.year_built.flatten(),
    )?;
    validate_coordinates(payload.latitude.flatten(), payload.longitude.flatten())?;
    let currency = payload.currency.as_deref().map(currency_code).transpose()?;
    let photos = payload.photos.map(validate_photos).transpose()?;
    let amenity_codes = payload
        .amenities
        .as_deref()
        .map(normalize_codes)
        .transpose()?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(currency) = currency {
        active.currency = Set(currency);
    }
    if let Some(category) = payload.category {
        active.category = Set(category.as_str().to_string());
    }
    if let Some(property_type) = payload.property_type {
        active.property_type = Set(property_type.as_str().to_string());
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(bedrooms) = payload.bedrooms {
        active.bedrooms = Set(bedrooms);
    }
    if let Some(bathrooms) = payload.bathrooms {
        active.bathrooms = Set(bathrooms);
    }
    if let Some(area_sqft) = payload.area_sqft {
        active.area_sqft = Set(area_sqft);
    }
    if let Some(year_built) = payload.year_built {
        active.year_built = Set(year_built);
    }
    if let Some(address_line1) = payload.address_line1 {
        active.address_line1 = Set(blank_to_none(address_line1));
    }
    if let Some(address_line2) = payload.address_line2 {
        active.address_line2 = Set(blank_to_none(address_line2));
    }
    if let Some(city) = payload.city {
        active.city = Set(blank_to_none(city));
    }
    if let Some(state_name) = payload.state {
        active.state = Set(blank_to_none(state_name));
    }
    if let Some(postal_code) = payload.postal_code {
        active.postal_code = Set(blank_to_none(postal_code));
    }
    if let Some(country) = payload.country {
        active.country = Set(blank_to_none(country));
    }
    if let Some(latitude) = payload.latitude {
        active.latitude = Set(latitude);
    }
    if let Some(longitude) = payload.longitude {
        active.longitude = Set(longitude);
    }
    active.updated_at = Set(Utc::now().into());
    let listing = active.update(&txn).await?;

    let photos_replaced = photos.is_some();
    if let Some(photos) = photos {
        replace_photos(&txn, listing.id, photos).await?;
    }
    let amenities_replaced = amenity_codes.is_some();
    if let Some(codes) = amenity_codes {
        replace_listing_amenities(&txn, listing.id, &codes).await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ListingUpdate,
        serde_json::json!({
            "listing_id": listing.id,
            "photos_replaced": photos_replaced,
            "amenities_replaced": amenities_replaced,
        }),
    )
    .await;

    let listing = load_one(&state.orm, listing).await?;
    Ok(ApiResponse::ok("Updated", listing))
}

pub async fn delete_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DeletedListing>> {
    ensure_lister(user)?;

    let txn = state.orm.begin().await?;
    let existing = Listings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.created_by_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    ListingPhotos::delete_many()
        .filter(PhotoCol::ListingId.eq(id))
        .exec(&txn)
        .await?;
    ListingAmenities::delete_many()
        .filter(LinkCol::ListingId.eq(id))
        .exec(&txn)
        .await?;
    Visits::delete_many()
        .filter(VisitCol::ListingId.eq(id))
        .exec(&txn)
        .await?;
    Listings::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ListingDelete,
        serde_json::json!({ "listing_id": id }),
    )
    .await;

    Ok(ApiResponse::ok("Deleted", DeletedListing { id }))
}

/// Replace the whole gallery; `order` follows the new array.
async fn replace_photos<C>(
    db: &C,
    listing_id: Uuid,
    photos: Vec<(String, Option<String>)>,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    ListingPhotos::delete_many()
        .filter(PhotoCol::ListingId.eq(listing_id))
        .exec(db)
        .await?;

    if photos.is_empty() {
        return Ok(());
    }

    let rows = photos
        .into_iter()
        .enumerate()
        .map(|(position, (url, caption))| PhotoActive {
            id: Set(Uuid::new_v4()),
            listing_id: Set(listing_id),
            url: Set(url),
            caption: Set(caption),
            position: Set(position as i32),
        });
    ListingPhotos::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

fn validate_photos(photos: Vec<PhotoInput>) -> AppResult<Vec<(String, Option<String>)>> {
    photos
        .into_iter()
        .map(|photo| {
            let (url, caption) = photo.into_parts();
            Ok((http_url(&url)?, blank_to_none(caption)))
        })
        .collect()
}

fn validate_details(
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    area_sqft: Option<i32>,
    year_built: Option<i32>,
) -> AppResult<()> {
    non_negative("bedrooms", bedrooms)?;
    non_negative("bathrooms", bathrooms)?;
    non_negative("area_sqft", area_sqft)?;
    in_range("year_built", year_built, 1800, 2100)
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> AppResult<()> {
    in_range("latitude", latitude, -90.0, 90.0)?;
    in_range("longitude", longitude, -180.0, 180.0)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%term%` with LIKE wildcards in the term escaped.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

async fn load_one<C>(db: &C, model: ListingModel) -> AppResult<Listing>
where
    C: ConnectionTrait,
{
    load_listings(db, vec![model])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

/// Attach photos, amenities and owner summaries, preserving input order.
async fn load_listings<C>(db: &C, models: Vec<ListingModel>) -> AppResult<Vec<Listing>>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let owner_ids: Vec<Uuid> = models.iter().map(|m| m.created_by_id).collect();

    let mut photos: HashMap<Uuid, Vec<ListingPhoto>> = HashMap::new();
    for photo in ListingPhotos::find()
        .filter(PhotoCol::ListingId.is_in(ids.clone()))
        .order_by_asc(PhotoCol::Position)
        .all(db)
        .await?
    {
        photos
            .entry(photo.listing_id)
            .or_default()
            .push(photo_from_entity(photo));
    }

    let mut amenities: HashMap<Uuid, Vec<Amenity>> = HashMap::new();
    for (link, amenity) in ListingAmenities::find()
        .filter(LinkCol::ListingId.is_in(ids))
        .find_also_related(Amenities)
        .all(db)
        .await?
    {
        if let Some(amenity) = amenity {
            amenities
                .entry(link.listing_id)
                .or_default()
                .push(amenity_from_entity(amenity));
        }
    }
    for list in amenities.values_mut() {
        list.sort_by(|a, b| a.code.cmp(&b.code));
    }

    let owners: HashMap<Uuid, UserModel> = Users::find()
        .filter(UserCol::Id.is_in(owner_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    models
        .into_iter()
        .map(|model| {
            let owner = owners.get(&model.created_by_id).map(owner_from_entity).transpose()?;
            let photos = photos.remove(&model.id).unwrap_or_default();
            let amenities = amenities.remove(&model.id).unwrap_or_default();
            listing_from_entity(model, photos, amenities, owner)
        })
        .collect()
}

fn listing_from_entity(
    model: ListingModel,
    photos: Vec<ListingPhoto>,
    amenities: Vec<Amenity>,
    owner: Option<ListingOwner>,
) -> AppResult<Listing> {
    Ok(Listing {
        id: model.id,
        title: model.title,
        description: model.description,
        price: model.price,
        currency: model.currency,
        category: model.category.parse()?,
        property_type: model.property_type.parse()?,
        bedrooms: model.bedrooms,
        bathrooms: model.bathrooms,
        area_sqft: model.area_sqft,
        year_built: model.year_built,
        address_line1: model.address_line1,
        address_line2: model.address_line2,
        city: model.city,
        state: model.state,
        postal_code: model.postal_code,
        country: model.country,
        latitude: model.latitude,
        longitude: model.longitude,
        is_active: model.is_active,
        created_by_id: model.created_by_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        photos,
        amenities,
        owner,
    })
}

fn summary_from_entity(model: ListingModel, cover_photo: Option<String>) -> AppResult<ListingSummary> {
    Ok(ListingSummary {
        id: model.id,
        title: model.title,
        price: model.price,
        currency: model.currency,
        city: model.city,
        state: model.state,
        category: model.category.parse()?,
        property_type: model.property_type.parse()?,
        bedrooms: model.bedrooms,
        bathrooms: model.bathrooms,
        cover_photo,
    })
}

fn photo_from_entity(model: PhotoModel) -> ListingPhoto {
    ListingPhoto {
        id: model.id,
        url: model.url,
        caption: model.caption,
        order: model.position,
    }
}

fn owner_from_entity(model: &UserModel) -> AppResult<ListingOwner> {
    Ok(ListingOwner {
        id: model.id,
        name: model.name.clone(),
        email: model.email.clone(),
        phone: model.phone.clone(),
        role: model.role.parse()?,
    })
}
