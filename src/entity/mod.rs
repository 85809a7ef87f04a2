pub mod amenities;
pub mod audit_logs;
pub mod listing_amenities;
pub mod listing_photos;
pub mod listings;
pub mod users;
pub mod visits;

pub use amenities::Entity as Amenities;
pub use audit_logs::Entity as AuditLogs;
pub use listing_amenities::Entity as ListingAmenities;
pub use listing_photos::Entity as ListingPhotos;
pub use listings::Entity as Listings;
pub use users::Entity as Users;
pub use visits::Entity as Visits;
