mod common;

use chrono::{DateTime, Duration, Utc};
use housing_market_api::{
    dto::{
        listings::CreateListingRequest,
        visits::{CreateVisitRequest, UpdateVisitRequest},
    },
    error::AppError,
    models::{ListingCategory, PropertyType, Role, VisitStatus},
    routes::params::VisitListQuery,
    services::{listing_service, visit_service},
};
use uuid::Uuid;

fn house() -> CreateListingRequest {
    CreateListingRequest {
        title: "Cozy Family House".into(),
        description: "Three bedrooms and a large backyard".into(),
        price: 220_000,
        currency: Some("usd".into()),
        category: ListingCategory::Rent,
        property_type: PropertyType::House,
        bedrooms: Some(3),
        bathrooms: Some(2),
        area_sqft: None,
        year_built: None,
        address_line1: None,
        address_line2: None,
        city: Some("San Jose".into()),
        state: Some("CA".into()),
        postal_code: None,
        country: None,
        latitude: None,
        longitude: None,
        photos: Vec::new(),
        amenities: Vec::new(),
    }
}

fn booking(listing_id: Uuid) -> CreateVisitRequest {
    CreateVisitRequest {
        user_id: None,
        user_email: None,
        listing_id,
        scheduled_at: Utc::now() + Duration::days(2),
        notes: Some("Morning works best".into()),
    }
}

// Buyers and guests book viewings; the owner sees and confirms them.
#[tokio::test]
async fn visit_booking_flow() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let seller = common::create_user(&state, Role::Seller, "seller@example.com").await?;
    let buyer = common::create_user(&state, Role::Buyer, "buyer@example.com").await?;
    let other = common::create_user(&state, Role::Renter, "renter@example.com").await?;

    let listing = listing_service::create_listing(&state, &seller, house())
        .await?
        .data
        .unwrap();
    assert_eq!(listing.currency, "USD");

    // Signed-in caller
    let visit = visit_service::create_visit(&state, Some(&buyer), booking(listing.id))
        .await?
        .data
        .unwrap();
    assert_eq!(visit.user_id, buyer.user_id);
    assert_eq!(visit.status, VisitStatus::Requested);
    assert_eq!(visit.listing.as_ref().map(|l| l.title.as_str()), Some("Cozy Family House"));

    // Anonymous caller with an email gets a guest account
    let guest_visit = visit_service::create_visit(
        &state,
        None,
        CreateVisitRequest {
            user_email: Some("walk-in@example.com".into()),
            ..booking(listing.id)
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(
        guest_visit.user.as_ref().map(|u| u.email.as_str()),
        Some("walk-in@example.com")
    );

    let err = visit_service::create_visit(&state, None, booking(listing.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = visit_service::create_visit(
        &state,
        None,
        CreateVisitRequest {
            user_id: Some(Uuid::new_v4()),
            ..booking(listing.id)
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = visit_service::create_visit(&state, Some(&buyer), booking(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Visibility
    let buyer_view = visit_service::list_visits(&state, &buyer, VisitListQuery::default())
        .await?
        .data
        .unwrap();
    assert_eq!(buyer_view.items.len(), 1);

    let seller_view = visit_service::list_visits(&state, &seller, VisitListQuery::default())
        .await?;
    assert_eq!(seller_view.meta.as_ref().and_then(|m| m.total), Some(2));

    let other_view = visit_service::list_visits(&state, &other, VisitListQuery::default())
        .await?
        .data
        .unwrap();
    assert!(other_view.items.is_empty());

    // Date window on scheduled_at
    let later = visit_service::create_visit(
        &state,
        Some(&buyer),
        CreateVisitRequest {
            scheduled_at: Utc::now() + Duration::days(10),
            ..booking(listing.id)
        },
    )
    .await?
    .data
    .unwrap();
    let window = |from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>| VisitListQuery {
        from,
        to,
        ..Default::default()
    };
    let after_first = visit_service::list_visits(
        &state,
        &buyer,
        window(Some(Utc::now() + Duration::days(5)), None),
    )
    .await?
    .data
    .unwrap();
    let ids: Vec<Uuid> = after_first.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![later.id]);

    let around_first = visit_service::list_visits(
        &state,
        &buyer,
        window(
            Some(Utc::now() + Duration::days(1)),
            Some(Utc::now() + Duration::days(3)),
        ),
    )
    .await?
    .data
    .unwrap();
    let ids: Vec<Uuid> = around_first.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![visit.id]);

    let before_any = visit_service::list_visits(
        &state,
        &buyer,
        window(None, Some(Utc::now() + Duration::days(1))),
    )
    .await?
    .data
    .unwrap();
    assert!(before_any.items.is_empty());

    // Strangers cannot touch the visit
    let err = visit_service::update_visit(
        &state,
        &other,
        visit.id,
        UpdateVisitRequest {
            status: Some(VisitStatus::Canceled),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let confirmed = visit_service::update_visit(
        &state,
        &seller,
        visit.id,
        UpdateVisitRequest {
            status: Some(VisitStatus::Confirmed),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(confirmed.status, VisitStatus::Confirmed);
    assert_eq!(confirmed.notes.as_deref(), Some("Morning works best"));

    let cleared = visit_service::update_visit(
        &state,
        &buyer,
        visit.id,
        UpdateVisitRequest {
            notes: Some(String::new()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cleared.notes, None);
    assert_eq!(cleared.status, VisitStatus::Confirmed);

    let confirmed_only = visit_service::list_visits(
        &state,
        &seller,
        VisitListQuery {
            status: Some("confirmed".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(confirmed_only.items.len(), 1);
    assert_eq!(confirmed_only.items[0].id, visit.id);

    let err = visit_service::update_visit(
        &state,
        &seller,
        Uuid::new_v4(),
        UpdateVisitRequest::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}
