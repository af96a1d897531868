use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        claims::AdminPrincipal,
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo::{StoreError, UserStore},
        repo_types::{NewUser, PublicUser, Role, User},
    },
    error::{ApiError, ApiResult, ADMIN_ONLY, INVALID_CREDENTIALS},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an account. `granted_by` is the admin behind the request, if any;
/// it is what allows an `admin` role when the default role is not `admin`.
pub async fn register(
    store: &dyn UserStore,
    default_role: Role,
    granted_by: Option<&AdminPrincipal>,
    req: RegisterRequest,
) -> ApiResult<User> {
    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Name, email and password are required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    let role = match req.role.as_deref() {
        None => default_role,
        Some(r) => match Role::parse(r) {
            Role::Unknown => return Err(ApiError::validation("Invalid role")),
            role => role,
        },
    };

    if role == Role::Admin && default_role != Role::Admin && granted_by.is_none() {
        let bootstrap = !store.has_admin().await.map_err(store_error)?;
        if !bootstrap {
            warn!(email = %email, "admin registration without admin token");
            return Err(ApiError::Authorization(ADMIN_ONLY));
        }
        info!(email = %email, "bootstrapping first admin");
    }

    // Cheap pre-check; the store's unique constraint settles races.
    if store.find_by_email(&email).await.map_err(store_error)?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password_blocking(req.password).await?;

    let user = store
        .create(NewUser {
            name,
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail => {
                warn!("email already registered (concurrent insert)");
                ApiError::Conflict("Email already registered".into())
            }
            other => store_error(other),
        })?;

    info!(
        user_id = %user.id,
        role = user.role.as_str(),
        granted_by = ?granted_by.map(|p| p.user_id),
        "user registered"
    );
    Ok(user)
}

/// Check credentials and mint a token. Unknown email and wrong password
/// produce the same error after the same amount of hashing work.
pub async fn login(store: &dyn UserStore, keys: &JwtKeys, req: LoginRequest) -> ApiResult<AuthResponse> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = store.find_by_email(&email).await.map_err(store_error)?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let ok = verify_password_blocking(req.password, stored_hash).await?;

    let user = match (user, ok) {
        (Some(u), true) => u,
        (None, _) => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Authentication(INVALID_CREDENTIALS));
        }
        (Some(u), false) => {
            warn!(email = %email, user_id = %u.id, "login invalid password");
            return Err(ApiError::Authentication(INVALID_CREDENTIALS));
        }
    };

    let token = keys.sign(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        token,
        user: PublicUser::from(&user),
    })
}

fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::DuplicateEmail => ApiError::Conflict("Email already registered".into()),
        StoreError::Other(e) => ApiError::Unexpected(e),
    }
}
