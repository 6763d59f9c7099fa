use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// SMTP relay used for confirmation and password-reset emails.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
}

/// S3/MinIO bucket holding property images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub app_host: String,
    pub port: u16,
    pub backend_url: String,
    pub cookie_secure: bool,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: env_or("JWT_ISSUER", "bienesraices"),
            audience: env_or("JWT_AUDIENCE", "bienesraices-web"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60 * 24),
        };
        let email = EmailConfig {
            host: env_or("EMAIL_HOST", "localhost"),
            port: env_parse("EMAIL_PORT", 2525),
            user: env_or("EMAIL_USER", ""),
            password: env_or("EMAIL_PASSWORD", ""),
            from: env_or("EMAIL_FROM", "BienesRaices <no-reply@bienesraices.com>"),
        };
        let storage = StorageConfig {
            endpoint: env_or("MINIO_ENDPOINT", "http://localhost:9000"),
            bucket: env_or("MINIO_BUCKET", "bienesraices"),
            access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
            secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
            region: env_or("MINIO_REGION", "us-east-1"),
        };
        Ok(Self {
            database_url,
            app_host: env_or("APP_HOST", "0.0.0.0"),
            port: env_parse("PORT", 3000),
            backend_url: env_or("BACKEND_URL", "http://localhost"),
            cookie_secure: env_parse("COOKIE_SECURE", false),
            jwt,
            email,
            storage,
        })
    }

    /// Public origin used in links sent by email, e.g. `http://localhost:3000`.
    pub fn public_origin(&self) -> String {
        format!("{}:{}", self.backend_url.trim_end_matches('/'), self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_origin_joins_url_and_port() {
        let mut cfg = crate::state::AppState::fake_config();
        cfg.backend_url = "http://example.test/".into();
        cfg.port = 4000;
        assert_eq!(cfg.public_origin(), "http://example.test:4000");
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        assert_eq!(env_parse("BIENESRAICES_TEST_UNSET_KEY", 42u16), 42);
    }
}
