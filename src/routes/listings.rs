use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::listings::{
        AmenityList, CreateListingRequest, DeletedListing, ListingList, ListingSummaryList,
        MapPointList, UpdateListingRequest,
    },
    error::AppResult,
    middleware::{
        auth::AuthUser,
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    models::Listing,
    response::ApiResponse,
    routes::params::{ListingQuery, MapQuery, PageQuery},
    services::{amenity_service, listing_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_listings).post(create_listing))
        .route(
            "/{id}",
            get(get_listing).patch(update_listing).delete(delete_listing),
        )
}

pub fn me_router() -> Router<AppState> {
    Router::new().route("/listings", get(my_listings))
}

pub fn map_router() -> Router<AppState> {
    Router::new().route("/listings", get(map_listings))
}

pub fn amenities_router() -> Router<AppState> {
    Router::new().route("/", get(list_amenities))
}

#[utoipa::path(
    get,
    path = "/api/listings",
    params(ListingQuery),
    responses(
        (status = 200, description = "Search active listings", body = ApiResponse<ListingSummaryList>),
        (status = 400, description = "Unknown category or property type")
    ),
    tag = "Listings"
)]
pub async fn list_listings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListingQuery>,
) -> AppResult<Json<ApiResponse<ListingSummaryList>>> {
    let resp = listing_service::search_listings(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing with photos, amenities and owner", body = ApiResponse<Listing>),
        (status = 404, description = "Listing not found"),
    ),
    tag = "Listings"
)]
pub async fn get_listing(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = listing_service::get_listing(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Create listing", body = ApiResponse<Listing>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Only sellers and agents may list")
    ),
    security(("bearer_auth" = []), ("cookie_auth" = [])),
    tag = "Listings"
)]
pub async fn create_listing(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateListingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Listing>>)> {
    let resp = listing_service::create_listing(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Updated listing", body = ApiResponse<Listing>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = []), ("cookie_auth" = [])),
    tag = "Listings"
)]
pub async fn update_listing(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateListingRequest>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = listing_service::update_listing(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Deleted listing", body = ApiResponse<DeletedListing>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = []), ("cookie_auth" = [])),
    tag = "Listings"
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<DeletedListing>>> {
    let resp = listing_service::delete_listing(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/me/listings",
    params(PageQuery),
    responses(
        (status = 200, description = "Listings created by the caller", body = ApiResponse<ListingList>),
        (status = 403, description = "Only sellers and agents have listings")
    ),
    security(("bearer_auth" = []), ("cookie_auth" = [])),
    tag = "Listings"
)]
pub async fn my_listings(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<ApiResponse<ListingList>>> {
    let resp = listing_service::my_listings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/map/listings",
    params(MapQuery),
    responses(
        (status = 200, description = "Up to 300 map points", body = ApiResponse<MapPointList>)
    ),
    tag = "Map"
)]
pub async fn map_listings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MapQuery>,
) -> AppResult<Json<ApiResponse<MapPointList>>> {
    let resp = listing_service::map_points(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/amenities",
    responses(
        (status = 200, description = "All known amenities", body = ApiResponse<AmenityList>)
    ),
    tag = "Listings"
)]
pub async fn list_amenities(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<AmenityList>>> {
    let resp = amenity_service::list_amenities(&state).await?;
    Ok(Json(resp))
}
