use std::sync::Arc;

use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};

use placement_db::Database;
use placement_db::models::{NewUser, UserRow};
use placement_db::queries;
use placement_types::Role;
use placement_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest, ResetPasswordRequest};

use crate::error::{ApiError, ValidJson};
use crate::middleware::Actor;
use crate::validate;
use crate::views;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store(anyhow!("worker task failed"))
        })?
}

pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.role == Role::Admin {
        return Err(ApiError::Forbidden(
            "Admin accounts can only be created by an admin".into(),
        ));
    }

    // Students sign up with their student ID as username
    let username = match req.role {
        Role::Student => req
            .student_id
            .filter(|id| !id.trim().is_empty())
            .or(req.username),
        _ => req.username,
    }
    .ok_or_else(|| ApiError::validation("Username is required"))?;

    if req.role == Role::Student && req.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("Name is required for students"));
    }

    let user = create_account(
        &state,
        Account {
            username,
            password: req.password,
            role: req.role,
            name: req.name,
            email: req.email,
        },
    )
    .await?;

    let token = create_token(&state.jwt_secret, &user, state.token_ttl)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: views::user(user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |db| {
        let user = db
            .get_user_by_username(validate::lookup_name(&req.username))?
            .ok_or(ApiError::InvalidCredentials)?;
        verify_password(&req.password, &user.password)?;
        Ok(user)
    })
    .await?;

    let token = create_token(&state.jwt_secret, &user, state.token_ttl)?;

    Ok(Json(AuthResponse {
        user: views::user(user),
        token,
    }))
}

pub async fn current_user(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |db| {
        db.get_user_by_id(actor.id)?
            .ok_or(ApiError::Unauthenticated)
    })
    .await?;

    Ok(Json(views::user(user)))
}

/// Reset by username alone; there is no email or token confirmation step.
pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate::password(&req.password)?;

    blocking(&state, move |db| {
        let username = validate::lookup_name(&req.username);
        let password_hash = hash_password(&req.password)?;
        if !db.set_password(username, &password_hash)? {
            return Err(ApiError::not_found("User"));
        }
        info!("Password reset for {}", username);
        Ok(())
    })
    .await?;

    Ok(Json(serde_json::json!({ "message": "Password reset successful" })))
}

pub(crate) struct Account {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: String,
}

/// Validate, hash and insert a new user. Shared by public registration and
/// admin account creation.
pub(crate) async fn create_account(state: &AppState, account: Account) -> Result<UserRow, ApiError> {
    let username = validate::username(&account.username)?;
    validate::password(&account.password)?;
    let email = validate::email(&account.email)?;
    let name = validate::optional_text("name", account.name.as_deref())?;

    blocking(state, move |db| {
        let password_hash = hash_password(&account.password)?;
        let user = db.transaction(|tx| {
            if queries::user_by_username(tx, &username)?.is_some() {
                return Err(ApiError::validation("Username already exists"));
            }
            let row = queries::insert_user(
                tx,
                &NewUser {
                    username: &username,
                    password_hash: &password_hash,
                    role: account.role,
                    name: name.as_deref(),
                    email: &email,
                },
            )?;
            Ok(row)
        })?;
        info!("Created {} account {} (id {})", user.role, user.username, user.id);
        Ok(user)
    })
    .await
}

/// Create the configured admin account unless that username already exists.
pub fn ensure_admin(db: &Database, username: &str, password: &str, email: &str) -> anyhow::Result<bool> {
    if db.get_user_by_username(username)?.is_some() {
        return Ok(false);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow!("{}", e))?;
    db.create_user(&NewUser {
        username,
        password_hash: &password_hash,
        role: Role::Admin,
        name: None,
        email,
    })?;

    info!("Bootstrapped admin account {}", username);
    Ok(true)
}

/// Hash password with Argon2id
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Store(anyhow!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Store(anyhow!("stored password hash is unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)
}

pub fn create_token(secret: &str, user: &UserRow, ttl: Duration) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: (Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> UserRow {
        UserRow {
            id,
            username: format!("user{id}"),
            password: String::new(),
            role,
            name: None,
            email: "u@example.com".into(),
        }
    }

    #[test]
    fn token_roundtrip() {
        let token = create_token("secret", &user(42, Role::Company), Duration::hours(1)).unwrap();
        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Company);
        assert_eq!(claims.username, "user42");
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let token = create_token("secret", &user(1, Role::Student), Duration::hours(1)).unwrap();
        assert!(decode_token("other-secret", &token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let token = create_token("secret", &user(1, Role::Student), Duration::hours(-2)).unwrap();
        assert!(decode_token("secret", &token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn ensure_admin_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(ensure_admin(&db, "root", "admin-password", "root@example.com").unwrap());
        assert!(!ensure_admin(&db, "root", "admin-password", "root@example.com").unwrap());
        let admin = db.get_user_by_username("root").unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
