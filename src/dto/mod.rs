pub mod auth;
pub mod listings;
pub mod uploads;
pub mod visits;
