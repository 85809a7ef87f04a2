use std::env;

const DEV_JWT_SECRET: &str = "dev-only-secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_secure: bool,
    pub allowed_origin: String,
    pub upload_dir: String,
    pub public_base: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("APP_PORT", 4000);
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, falling back to the development secret");
            DEV_JWT_SECRET.to_string()
        });
        let public_base =
            env::var("PUBLIC_BASE").unwrap_or_else(|_| format!("http://localhost:{port}"));

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            token_ttl_hours: parse_var("TOKEN_TTL_HOURS", 24 * 7),
            cookie_secure: parse_var("COOKIE_SECURE", false),
            allowed_origin: env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            public_base: public_base.trim_end_matches('/').to_string(),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
        })
    }

    /// Settings for tests and tools that never bind a listener.
    pub fn for_tests(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 4000,
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
            cookie_secure: false,
            allowed_origin: "http://localhost:3000".to_string(),
            upload_dir: std::env::temp_dir()
                .join("housing-market-uploads")
                .to_string_lossy()
                .into_owned(),
            public_base: "http://localhost:4000".to_string(),
            max_upload_bytes: 1024 * 1024,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!("invalid value for {key}, using default");
            default
        }),
        Err(_) => default,
    }
}
