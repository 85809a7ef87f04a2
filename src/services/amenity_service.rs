use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::listings::AmenityList,
    entity::{
        amenities::{ActiveModel as AmenityActive, Column as AmenityCol, Entity as Amenities, Model as AmenityModel},
        listing_amenities::{ActiveModel as LinkActive, Column as LinkCol, Entity as ListingAmenities},
    },
    error::{AppError, AppResult},
    models::Amenity,
    response::ApiResponse,
    state::AppState,
};

/// Upper-case the code and collapse whitespace runs into `_`.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase();
    (!code.is_empty()).then_some(code)
}

/// Normalize a requested amenity list, keeping first occurrences in order.
pub fn normalize_codes(raw: &[String]) -> AppResult<Vec<String>> {
    let mut codes: Vec<String> = Vec::with_capacity(raw.len());
    for entry in raw {
        let code = normalize_code(entry)
            .ok_or_else(|| AppError::BadRequest("amenity codes must not be empty".into()))?;
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    Ok(codes)
}

pub fn label_for(code: &str) -> String {
    code.replace('_', " ")
}

/// Insert any missing codes and return the rows for all of them.
pub async fn upsert_amenities<C>(db: &C, codes: &[String]) -> AppResult<Vec<AmenityModel>>
where
    C: ConnectionTrait,
{
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    for code in codes {
        let active = AmenityActive {
            id: Set(Uuid::new_v4()),
            code: Set(code.clone()),
            label: Set(label_for(code)),
        };
        Amenities::insert(active)
            .on_conflict(OnConflict::column(AmenityCol::Code).do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;
    }

    let amenities = Amenities::find()
        .filter(AmenityCol::Code.is_in(codes.iter().cloned()))
        .all(db)
        .await?;
    Ok(amenities)
}

/// Drop every amenity link of the listing and link the given codes instead.
pub async fn replace_listing_amenities<C>(db: &C, listing_id: Uuid, codes: &[String]) -> AppResult<()>
where
    C: ConnectionTrait,
{
    ListingAmenities::delete_many()
        .filter(LinkCol::ListingId.eq(listing_id))
        .exec(db)
        .await?;

    let amenities = upsert_amenities(db, codes).await?;
    if amenities.is_empty() {
        return Ok(());
    }

    let links = amenities.into_iter().map(|amenity| LinkActive {
        listing_id: Set(listing_id),
        amenity_id: Set(amenity.id),
    });
    ListingAmenities::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn list_amenities(state: &AppState) -> AppResult<ApiResponse<AmenityList>> {
    let items = Amenities::find()
        .order_by_asc(AmenityCol::Code)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(amenity_from_entity)
        .collect();
    Ok(ApiResponse::ok("Amenities", AmenityList { items }))
}

pub fn amenity_from_entity(model: AmenityModel) -> Amenity {
    Amenity {
        id: model.id,
        code: model.code,
        label: model.label,
    }
}
