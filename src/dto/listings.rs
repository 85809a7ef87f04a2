use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Amenity, Listing, ListingCategory, ListingSummary, MapPoint, PropertyType};

/// A bare URL or a URL with a caption.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PhotoInput {
    Url(String),
    Detailed { url: String, caption: Option<String> },
}

impl PhotoInput {
    pub fn into_parts(self) -> (String, Option<String>) {
        match self {
            PhotoInput::Url(url) => (url, None),
            PhotoInput::Detailed { url, caption } => (url, caption),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    pub title: String,
    pub description: String,
    /// Minor currency units
    pub price: i64,
    pub currency: Option<String>,
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
    #[serde(default)]
    pub photos: Vec<PhotoInput>,
    /// Amenity codes such as `PARKING` or `swimming pool`
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Partial update. For nullable columns an explicit `null` clears the value
/// while an absent key leaves it untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub currency: Option<String>,
    pub category: Option<ListingCategory>,
    pub property_type: Option<PropertyType>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<i32>)]
    pub bedrooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<i32>)]
    pub bathrooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<i32>)]
    pub area_sqft: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<i32>)]
    pub year_built: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub address_line1: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub address_line2: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub postal_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<Option<f64>>,
    /// When present, replaces every photo of the listing
    pub photos: Option<Vec<PhotoInput>>,
    /// When present, replaces every amenity link of the listing
    pub amenities: Option<Vec<String>>,
}

fn patch_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ListingList {
    #[schema(value_type = Vec<Listing>)]
    pub items: Vec<Listing>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ListingSummaryList {
    #[schema(value_type = Vec<ListingSummary>)]
    pub items: Vec<ListingSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct MapPointList {
    #[schema(value_type = Vec<MapPoint>)]
    pub items: Vec<MapPoint>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AmenityList {
    #[schema(value_type = Vec<Amenity>)]
    pub items: Vec<Amenity>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedListing {
    pub id: Uuid,
}
