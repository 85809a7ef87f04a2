use housing_market_api::{
    config::AppConfig,
    db::{DbPool, create_orm_conn, run_migrations},
    models::{ListingCategory, PASSWORD_PROVIDER, PropertyType, Role},
    services::amenity_service::upsert_amenities,
    session::hash_password,
    state::AppState,
    telemetry::init_tracing,
};
use uuid::Uuid;

const SELLER_EMAIL: &str = "placeholder-seller@example.com";
const SELLER_PASSWORD: &str = "Temp1234!";
const AMENITIES: [&str; 4] = ["PARKING", "POOL", "GYM", "GARDEN"];

struct SeedListing {
    title: &'static str,
    description: &'static str,
    price: i64,
    category: ListingCategory,
    property_type: PropertyType,
    bedrooms: i32,
    bathrooms: i32,
    area_sqft: i32,
    year_built: i32,
    address_line1: &'static str,
    city: &'static str,
    state: &'static str,
    postal_code: &'static str,
    latitude: f64,
    longitude: f64,
    photos: &'static [(&'static str, &'static str)],
    amenities: &'static [&'static str],
}

const LISTINGS: [SeedListing; 2] = [
    SeedListing {
        title: "Bright 2BR Condo near Downtown",
        description: "Sunny 2-bedroom condo with modern kitchen and balcony. Close to shops and transit.",
        price: 32_500_000,
        category: ListingCategory::Sale,
        property_type: PropertyType::Condo,
        bedrooms: 2,
        bathrooms: 1,
        area_sqft: 860,
        year_built: 2012,
        address_line1: "123 Maple St",
        city: "Austin",
        state: "TX",
        postal_code: "78701",
        latitude: 30.266666,
        longitude: -97.73333,
        photos: &[
            ("https://images.unsplash.com/photo-1505692794403-34d4982f88aa", "Living room"),
            ("https://images.unsplash.com/photo-1523217582562-09d0def993a6", "Kitchen"),
        ],
        amenities: &["PARKING", "GYM"],
    },
    SeedListing {
        title: "Cozy Family House with Garden",
        description: "3-bedroom single-family house with a large backyard and quiet street parking.",
        price: 220_000,
        category: ListingCategory::Rent,
        property_type: PropertyType::House,
        bedrooms: 3,
        bathrooms: 2,
        area_sqft: 1450,
        year_built: 2004,
        address_line1: "456 Oak Ave",
        city: "San Jose",
        state: "CA",
        postal_code: "95112",
        latitude: 37.338207,
        longitude: -121.88633,
        photos: &[
            ("https://images.unsplash.com/photo-1572120360610-d971b9d7767c", "Front view"),
            ("https://images.unsplash.com/photo-1560449204-e02f11c3d0e2", "Backyard"),
        ],
        amenities: &["GARDEN", "PARKING", "POOL"],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let state = AppState::new(orm, config);

    let seller_id = ensure_seller(&state.pool).await?;
    let codes: Vec<String> = AMENITIES.iter().map(|c| c.to_string()).collect();
    let amenities = upsert_amenities(&state.orm, &codes).await?;
    println!("Ensured {} amenities", amenities.len());

    for listing in &LISTINGS {
        seed_listing(&state.pool, seller_id, listing, &amenities).await?;
    }

    println!("Seed completed. Seller ID: {seller_id}");
    Ok(())
}

async fn ensure_seller(pool: &DbPool) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(SELLER_PASSWORD)?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, name, role, provider)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(SELLER_EMAIL)
    .bind(password_hash)
    .bind("Placeholder Seller")
    .bind(Role::Seller.as_str())
    .bind(PASSWORD_PROVIDER)
    .fetch_optional(pool)
    .await?;

    // If the seller already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(SELLER_EMAIL)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured seller {SELLER_EMAIL}");
    Ok(user_id)
}

async fn seed_listing(
    pool: &DbPool,
    seller_id: Uuid,
    data: &SeedListing,
    amenities: &[housing_market_api::entity::amenities::Model],
) -> anyhow::Result<()> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM listings WHERE title = $1 AND created_by_id = $2")
            .bind(data.title)
            .bind(seller_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        println!("Listing already seeded: {}", data.title);
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let listing_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO listings (
            id, title, description, price, currency, category, property_type,
            bedrooms, bathrooms, area_sqft, year_built, address_line1,
            city, state, postal_code, country, latitude, longitude, created_by_id
        )
        VALUES ($1, $2, $3, $4, 'USD', $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 'USA', $15, $16, $17)
        "#,
    )
    .bind(listing_id)
    .bind(data.title)
    .bind(data.description)
    .bind(data.price)
    .bind(data.category.as_str())
    .bind(data.property_type.as_str())
    .bind(data.bedrooms)
    .bind(data.bathrooms)
    .bind(data.area_sqft)
    .bind(data.year_built)
    .bind(data.address_line1)
    .bind(data.city)
    .bind(data.state)
    .bind(data.postal_code)
    .bind(data.latitude)
    .bind(data.longitude)
    .bind(seller_id)
    .execute(&mut *tx)
    .await?;

    for (position, (url, caption)) in data.photos.iter().enumerate() {
        sqlx::query(
            "INSERT INTO listing_photos (id, listing_id, url, caption, position) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(listing_id)
        .bind(*url)
        .bind(*caption)
        .bind(position as i32)
        .execute(&mut *tx)
        .await?;
    }

    for amenity in amenities.iter().filter(|a| data.amenities.contains(&a.code.as_str())) {
        sqlx::query("INSERT INTO listing_amenities (listing_id, amenity_id) VALUES ($1, $2)")
            .bind(listing_id)
            .bind(amenity.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    println!("Seeded listing: {}", data.title);
    Ok(())
}
