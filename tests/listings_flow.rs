mod common;

use housing_market_api::{
    dto::listings::{CreateListingRequest, PhotoInput, UpdateListingRequest},
    error::AppError,
    models::{ListingCategory, PropertyType, Role},
    routes::params::{ListingQuery, MapQuery, PageQuery},
    services::{amenity_service, listing_service},
};

fn condo(title: &str, city: &str, latitude: f64, longitude: f64) -> CreateListingRequest {
    CreateListingRequest {
        title: title.into(),
        description: "Sunny condo close to shops and transit".into(),
        price: 32_500_000,
        currency: None,
        category: ListingCategory::Sale,
        property_type: PropertyType::Condo,
        bedrooms: Some(2),
        bathrooms: Some(1),
        area_sqft: Some(860),
        year_built: Some(2012),
        address_line1: Some("123 Maple St".into()),
        address_line2: None,
        city: Some(city.into()),
        state: Some("TX".into()),
        postal_code: Some("78701".into()),
        country: Some("USA".into()),
        latitude: Some(latitude),
        longitude: Some(longitude),
        photos: vec![
            PhotoInput::Url("https://img.example.com/living.jpg".into()),
            PhotoInput::Detailed {
                url: "https://img.example.com/kitchen.jpg".into(),
                caption: Some("Kitchen".into()),
            },
        ],
        amenities: vec!["parking".into(), "swimming pool".into(), "PARKING".into()],
    }
}

// Seller creates, searches, maps, updates and deletes; strangers are kept out.
#[tokio::test]
async fn listing_lifecycle_flow() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let seller = common::create_user(&state, Role::Seller, "seller@example.com").await?;
    let agent = common::create_user(&state, Role::Agent, "agent@example.com").await?;
    let buyer = common::create_user(&state, Role::Buyer, "buyer@example.com").await?;

    // Buyers cannot list
    let err = listing_service::create_listing(&state, &buyer, condo("Nope", "Austin", 30.0, -97.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let created = listing_service::create_listing(
        &state,
        &seller,
        condo("Bright 2BR Condo", "Austin", 30.2666, -97.7333),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(created.currency, "USD");
    assert_eq!(created.photos.len(), 2);
    assert_eq!(created.photos[1].order, 1);
    assert_eq!(created.photos[1].caption.as_deref(), Some("Kitchen"));
    let codes: Vec<&str> = created.amenities.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["PARKING", "SWIMMING_POOL"]);
    assert_eq!(created.owner.as_ref().map(|o| o.id), Some(seller.user_id));

    listing_service::create_listing(
        &state,
        &agent,
        condo("Harbor view flat", "San Diego", 32.7157, -117.1611),
    )
    .await?;

    // Invalid payloads are rejected up front
    let mut bad = condo("Cheap", "Austin", 30.0, -97.0);
    bad.price = 0;
    let err = listing_service::create_listing(&state, &seller, bad)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Search
    let by_city = listing_service::search_listings(
        &state,
        ListingQuery {
            city: Some("austin".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(by_city.meta.as_ref().and_then(|m| m.total), Some(1));
    let summary = &by_city.data.unwrap().items[0];
    assert_eq!(summary.id, created.id);
    assert_eq!(
        summary.cover_photo.as_deref(),
        Some("https://img.example.com/living.jpg")
    );

    let by_text = listing_service::search_listings(
        &state,
        ListingQuery {
            q: Some("harbor".into()),
            min_price: Some(1),
            bedrooms: Some(2),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(by_text.data.unwrap().items.len(), 1);

    // Map: bounding box around Austin only
    let points = listing_service::map_points(
        &state,
        MapQuery {
            swlat: Some(29.0),
            swlng: Some(-99.0),
            nelat: Some(31.0),
            nelng: Some(-96.0),
            category: Some("sale".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(points.items.len(), 1);
    assert_eq!(points.items[0].id, created.id);

    let mine = listing_service::my_listings(&state, &seller, PageQuery::default())
        .await?
        .data
        .unwrap();
    assert_eq!(mine.items.len(), 1);

    // Only the owner may update
    let err = listing_service::update_listing(
        &state,
        &agent,
        created.id,
        UpdateListingRequest {
            price: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let updated = listing_service::update_listing(
        &state,
        &seller,
        created.id,
        UpdateListingRequest {
            price: Some(31_000_000),
            city: Some(None),
            photos: Some(vec![PhotoInput::Url(
                "https://img.example.com/new.jpg".into(),
            )]),
            amenities: Some(vec!["gym".into()]),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.price, 31_000_000);
    assert_eq!(updated.city, None);
    assert_eq!(updated.state.as_deref(), Some("TX"));
    assert_eq!(updated.photos.len(), 1);
    assert_eq!(updated.photos[0].order, 0);
    assert_eq!(updated.amenities.len(), 1);
    assert_eq!(updated.amenities[0].code, "GYM");

    // Amenities stay in the catalogue after being unlinked
    let catalogue = amenity_service::list_amenities(&state).await?.data.unwrap();
    let codes: Vec<String> = catalogue.items.into_iter().map(|a| a.code).collect();
    assert_eq!(codes, vec!["GYM", "PARKING", "SWIMMING_POOL"]);

    // Deactivated listings drop out of search but stay readable
    listing_service::update_listing(
        &state,
        &seller,
        created.id,
        UpdateListingRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;
    let active = listing_service::search_listings(&state, ListingQuery::default()).await?;
    assert_eq!(active.data.unwrap().items.len(), 1);
    assert!(listing_service::get_listing(&state, created.id).await.is_ok());

    // Delete
    let err = listing_service::delete_listing(&state, &agent, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    listing_service::delete_listing(&state, &seller, created.id).await?;
    let err = listing_service::get_listing(&state, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    let err = listing_service::delete_listing(&state, &seller, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // My listings follow the most recent edit
    let first = listing_service::create_listing(
        &state,
        &seller,
        condo("Garden duplex", "Austin", 30.3, -97.7),
    )
    .await?
    .data
    .unwrap();
    let second = listing_service::create_listing(
        &state,
        &seller,
        condo("Loft downtown", "Austin", 30.27, -97.74),
    )
    .await?
    .data
    .unwrap();
    let mine = listing_service::my_listings(&state, &seller, PageQuery::default())
        .await?
        .data
        .unwrap();
    assert_eq!(mine.items[0].id, second.id);

    let cleared = listing_service::update_listing(
        &state,
        &seller,
        first.id,
        UpdateListingRequest {
            photos: Some(vec![]),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(cleared.photos.is_empty());
    assert_eq!(cleared.amenities.len(), 2);

    let mine = listing_service::my_listings(&state, &seller, PageQuery::default())
        .await?
        .data
        .unwrap();
    let order: Vec<_> = mine.items.iter().map(|l| l.id).collect();
    assert_eq!(order, vec![first.id, second.id]);

    // Partial updates are validated like creates
    let invalid = [
        UpdateListingRequest {
            price: Some(0),
            ..Default::default()
        },
        UpdateListingRequest {
            year_built: Some(Some(1700)),
            ..Default::default()
        },
        UpdateListingRequest {
            photos: Some(vec![PhotoInput::Url("nope".into())]),
            ..Default::default()
        },
    ];
    for patch in invalid {
        let err = listing_service::update_listing(&state, &seller, first.id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    // Ownership and existence are settled before the payload is checked
    let err = listing_service::update_listing(
        &state,
        &agent,
        first.id,
        UpdateListingRequest {
            price: Some(0),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let err = listing_service::update_listing(
        &state,
        &seller,
        uuid::Uuid::new_v4(),
        UpdateListingRequest {
            price: Some(0),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // An incomplete bounding box is ignored
    let points = listing_service::map_points(
        &state,
        MapQuery {
            swlat: Some(29.0),
            nelat: Some(31.0),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(points.items.len(), 3);

    Ok(())
}
