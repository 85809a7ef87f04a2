use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Normalized page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE);
        Self { page, per_page }
    }

    pub fn limit(&self) -> u64 {
        self.per_page as u64
    }

    pub fn offset(&self) -> u64 {
        let skipped = (self.page - 1).saturating_mul(self.per_page);
        u64::try_from(skipped).unwrap_or(0)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, default 1
    pub page: Option<i64>,
    /// Items per page, default 20
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page, DEFAULT_PER_PAGE)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Case-insensitive match on the title
    pub q: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// SALE or RENT, any case
    pub category: Option<String>,
    pub property_type: Option<String>,
    /// Minimum number of bedrooms; 0 means any
    pub bedrooms: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListingQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page, DEFAULT_PER_PAGE)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MapQuery {
    /// South-west latitude of the bounding box
    pub swlat: Option<f64>,
    pub swlng: Option<f64>,
    /// North-east latitude of the bounding box
    pub nelat: Option<f64>,
    pub nelng: Option<f64>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitListQuery {
    pub user_id: Option<Uuid>,
    pub listing_id: Option<Uuid>,
    pub status: Option<String>,
    /// Earliest scheduled time (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Latest scheduled time (RFC 3339)
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    /// Items per page, default 50
    pub per_page: Option<i64>,
}

impl VisitListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page, 50)
    }
}
