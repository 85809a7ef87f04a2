#![allow(dead_code)]

use housing_market_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::users::ActiveModel as UserActive,
    middleware::auth::AuthUser,
    models::{PASSWORD_PROVIDER, Role},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

/// Database URL for flow tests, or `None` to skip them.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, visits, listing_amenities, amenities, listing_photos, listings, users CASCADE",
    ))
    .await?;

    Ok(AppState::new(orm, AppConfig::for_tests(database_url)))
}

pub async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(None),
        name: Set(Some(format!("{role} user"))),
        phone: Set(None),
        role: Set(role.as_str().to_string()),
        provider: Set(PASSWORD_PROVIDER.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role,
    })
}
