use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use crate::auth::Role;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Role given to registrations that do not ask for one.
    pub default_role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_image_bytes: usize,
    pub max_resume_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "portfolio".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "portfolio-admin".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES", 60 * 24 * 7)?,
        };
        anyhow::ensure!(jwt.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");

        let default_role = match std::env::var("AUTH_DEFAULT_ROLE") {
            Ok(v) => match Role::parse(&v) {
                Role::Unknown => anyhow::bail!("AUTH_DEFAULT_ROLE has unknown role {v:?}"),
                role => role,
            },
            Err(_) => Role::User,
        };

        let uploads = UploadConfig {
            dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".into())
                .into(),
            max_image_bytes: parse_var("UPLOAD_MAX_IMAGE_BYTES", 5 * 1024 * 1024)?,
            max_resume_bytes: parse_var("UPLOAD_MAX_RESUME_BYTES", 10 * 1024 * 1024)?,
        };

        Ok(Self {
            database_url,
            jwt,
            auth: AuthConfig { default_role },
            uploads,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} has invalid value {v:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default() {
        let v: i64 = parse_var("PORTFOLIO_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        std::env::set_var("PORTFOLIO_TEST_BAD_NUMBER", "seven");
        let err = parse_var::<i64>("PORTFOLIO_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(err.to_string().contains("PORTFOLIO_TEST_BAD_NUMBER"));
    }
}
