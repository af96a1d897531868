use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{
    auth::{
        claims::{AdminPrincipal, Claims},
        repo_types::{Role, User},
    },
    config::JwtConfig,
    error::{ApiError, ADMIN_ONLY, INVALID_TOKEN, MISSING_TOKEN},
    state::AppState,
};

/// Signing and verification keys, built once from configuration.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        self.sign_at(user, OffsetDateTime::now_utc())
    }

    pub fn sign_at(&self, user: &User, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let exp = issued_at + self.ttl;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: issued_at.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user.id, role = user.role.as_str(), "jwt signed");
        Ok(token)
    }

    /// Checks signature, issuer, audience and expiry. Any failure is an
    /// authentication error with one fixed message.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Authentication(INVALID_TOKEN)
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }

    /// The admin gate: authenticate the bearer token, then require the
    /// admin role claim. Never consults the user store.
    pub fn verify_admin(&self, token: Option<&str>) -> Result<AdminPrincipal, ApiError> {
        let token = token.ok_or(ApiError::Authentication(MISSING_TOKEN))?;
        let claims = self.verify(token)?;
        if claims.role != Role::Admin {
            warn!(user_id = %claims.sub, role = claims.role.as_str(), "non-admin denied");
            return Err(ApiError::Authorization(ADMIN_ONLY));
        }
        Ok(AdminPrincipal {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}
