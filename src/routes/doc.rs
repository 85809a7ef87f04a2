use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, LogoutResponse, SignupRequest, SignupResponse},
        listings::{
            AmenityList, CreateListingRequest, DeletedListing, ListingList, ListingSummaryList,
            MapPointList, PhotoInput, UpdateListingRequest,
        },
        uploads::{UploadForm, UploadResponse},
        visits::{CreateVisitRequest, UpdateVisitRequest, VisitList},
    },
    models::{
        Amenity, Listing, ListingCategory, ListingOwner, ListingPhoto, ListingSummary, MapPoint,
        PropertyType, Role, User, Visit, VisitListing, VisitStatus, VisitUser,
    },
    response::{ApiResponse, Meta},
    routes::{auth, health, listings, uploads, visits},
    session::AUTH_COOKIE,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(AUTH_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        auth::logout,
        auth::me,
        listings::list_listings,
        listings::get_listing,
        listings::create_listing,
        listings::update_listing,
        listings::delete_listing,
        listings::my_listings,
        listings::map_listings,
        listings::list_amenities,
        visits::create_visit,
        visits::list_visits,
        visits::update_visit,
        uploads::upload
    ),
    components(
        schemas(
            Role,
            ListingCategory,
            PropertyType,
            VisitStatus,
            User,
            ListingOwner,
            ListingPhoto,
            Amenity,
            Listing,
            ListingSummary,
            MapPoint,
            Visit,
            VisitUser,
            VisitListing,
            SignupRequest,
            LoginRequest,
            SignupResponse,
            LoginResponse,
            LogoutResponse,
            PhotoInput,
            CreateListingRequest,
            UpdateListingRequest,
            ListingList,
            ListingSummaryList,
            MapPointList,
            AmenityList,
            DeletedListing,
            CreateVisitRequest,
            UpdateVisitRequest,
            VisitList,
            UploadForm,
            UploadResponse,
            health::HealthData,
            Meta,
            ApiResponse<Listing>,
            ApiResponse<ListingSummaryList>,
            ApiResponse<Visit>,
            ApiResponse<VisitList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Signup, login and session endpoints"),
        (name = "Listings", description = "Listing search and management"),
        (name = "Map", description = "Map markers"),
        (name = "Visits", description = "Viewing appointments"),
        (name = "Uploads", description = "Listing photo uploads"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/signup",
            "/api/listings/{id}",
            "/api/me/listings",
            "/api/map/listings",
            "/api/amenities",
            "/api/visits/{id}",
            "/api/upload",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
