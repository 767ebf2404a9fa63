use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// Credentials for the admin account seeded at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin: AdminSeed,
}

impl AppConfig {
    /// Secrets have no fallback values; a missing variable aborts startup.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
        };
        let admin = AdminSeed {
            username: std::env::var("ADMIN_USERNAME").context("ADMIN_USERNAME must be set")?,
            password: std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?,
            email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            admin,
        })
    }
}
