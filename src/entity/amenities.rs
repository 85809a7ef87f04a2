use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "amenities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub label: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::listing_amenities::Entity")]
    ListingAmenities,
}

impl Related<super::listing_amenities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListingAmenities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
