use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::{config::Config, db_helpers::get_user_by_id, errors::RequestError};

const JWT_EXPIRY_DURATION: time::Duration = time::Duration::days(90);
pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

/// The logged in user, if the request carries a valid token for a user that
/// still exists. A stale or forged token is treated as anonymous.
pub struct MaybeUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = match token_from_parts(parts) {
            Some(token) => token,
            None => return Ok(MaybeUser(None)),
        };
        let config = parts
            .extensions
            .get::<Arc<Config>>()
            .cloned()
            .ok_or(RequestError::ServerError)?;
        let pool = parts
            .extensions
            .get::<Arc<SqlitePool>>()
            .cloned()
            .ok_or(RequestError::ServerError)?;

        let id = match verify_jwt_token(&token, &config.jwt_secret) {
            Ok(id) => id,
            Err(_) => return Ok(MaybeUser(None)),
        };

        let user = get_user_by_id(&pool, id).await?.map(|user| AuthUser {
            id: user.id,
            username: user.username,
            is_staff: user.is_staff,
        });
        Ok(MaybeUser(user))
    }
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Token "));
    if let Some(token) = from_header {
        return Some(token.to_owned());
    }
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .find_map(|cookies| cookie_value(cookies, TOKEN_COOKIE))
}

fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_owned())
    })
}

pub fn token_cookie(token: &str) -> String {
    format!("{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_token_cookie() -> String {
    format!("{TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

// ----------------- Permission Checks -----------------

pub fn require_user(user: Option<AuthUser>) -> Result<AuthUser, RequestError> {
    user.ok_or(RequestError::Forbidden)
}

/// Anonymous visitors are sent to the login page, logged in users without the
/// staff flag are refused.
pub fn require_staff(user: Option<AuthUser>) -> Result<AuthUser, RequestError> {
    match user {
        None => Err(RequestError::NotAuthorized),
        Some(user) if user.is_staff => Ok(user),
        Some(_) => Err(RequestError::Forbidden),
    }
}

pub fn require_owner(user: Option<AuthUser>, owner_id: i64) -> Result<AuthUser, RequestError> {
    match user {
        Some(user) if user.id == owner_id => Ok(user),
        _ => Err(RequestError::Forbidden),
    }
}

pub fn require_staff_owner(
    user: Option<AuthUser>,
    owner_id: i64,
) -> Result<AuthUser, RequestError> {
    let user = require_owner(user, owner_id)?;
    if !user.is_staff {
        return Err(RequestError::Forbidden);
    }
    Ok(user)
}

// ----------------- Tokens & Passwords -----------------

pub fn get_jwt_token(id: i64, jwt_secret: &str) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + JWT_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Error verifying token: {}", e);
        RequestError::NotAuthorized
    })?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized);
    }
    Ok(claim.id)
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
