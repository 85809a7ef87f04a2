pub mod amenity_service;
pub mod auth_service;
pub mod listing_service;
pub mod upload_service;
pub mod visit_service;
