use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Upper-case string enums stored as TEXT columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::BadRequest(format!(
                        concat!("invalid ", $kind, ": {}"),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Marketplace role; gates which routes a user may call.
    Role, "role" {
        Buyer => "BUYER",
        Seller => "SELLER",
        Renter => "RENTER",
        Agent => "AGENT",
    }
);

text_enum!(ListingCategory, "category" {
    Sale => "SALE",
    Rent => "RENT",
});

text_enum!(PropertyType, "property type" {
    Apartment => "APARTMENT",
    House => "HOUSE",
    Villa => "VILLA",
    Condo => "CONDO",
    Townhouse => "TOWNHOUSE",
    Land => "LAND",
    Other => "OTHER",
});

text_enum!(VisitStatus, "visit status" {
    Requested => "REQUESTED",
    Confirmed => "CONFIRMED",
    Canceled => "CANCELED",
    Completed => "COMPLETED",
});

impl Role {
    /// Roles allowed to publish and manage listings.
    pub const LISTERS: [Role; 2] = [Role::Seller, Role::Agent];
}

impl Default for Role {
    fn default() -> Self {
        Role::Buyer
    }
}

pub const PASSWORD_PROVIDER: &str = "PASSWORD";

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingOwner {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingPhoto {
    pub id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Amenity {
    pub id: Uuid,
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub category: ListingCategory,
    pub property_type: PropertyType,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_sqft: Option<i32>,
    pub year_built: Option<i32>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub photos: Vec<ListingPhoto>,
    pub amenities: Vec<Amenity>,
    pub owner: Option<ListingOwner>,
}

/// Card-sized projection used by search results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingSummary {
    pub id: Uuid,
    pub title: String,
    pub price: i64,
    pub currency: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub category: ListingCategory,
    pub property_type: PropertyType,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub cover_photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MapPoint {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub price: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitListing {
    pub id: Uuid,
    pub title: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Visit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: VisitStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Option<VisitUser>,
    pub listing: Option<VisitListing>,
}
