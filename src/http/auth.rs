//! Request identity.
//!
//! A bearer JWT (HS256) identifies a signed-in user; without one, the
//! `X-Guest-Id` header identifies a guest session.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::domain::value_objects::Owner;
use crate::http::AppState;
use crate::EcommerceError;

pub const GUEST_HEADER: &str = "x-guest-id";
const MAX_GUEST_ID_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
}

pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self { encoding: EncodingKey::from_secret(bytes), decoding: DecodingKey::from_secret(bytes) }
    }

    pub fn issue(&self, user_id: Uuid, role: Role, ttl: chrono::Duration) -> Result<String, EcommerceError> {
        let claims = Claims { sub: user_id, role, exp: (Utc::now() + ttl).timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| EcommerceError::Unauthorized(format!("token signing failed: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Claims, EcommerceError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                warn!(error = %e, "rejected bearer token");
                EcommerceError::Unauthorized("invalid token".into())
            })
    }
}

fn bearer_claims(parts: &Parts, keys: &Arc<JwtKeys>) -> Result<Option<Claims>, EcommerceError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else { return Ok(None) };
    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| EcommerceError::Unauthorized("invalid authorization header".into()))?;
    keys.verify(token.trim()).map(Some)
}

/// Cart owner: the signed-in user, else the guest session.
#[derive(Debug, Clone)]
pub struct OwnerCtx(pub Owner);

#[async_trait]
impl FromRequestParts<AppState> for OwnerCtx {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = bearer_claims(parts, &state.auth)? {
            return Ok(Self(Owner::User(claims.sub)));
        }
        let guest = parts
            .headers
            .get(GUEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_GUEST_ID_LEN);
        match guest {
            Some(id) => Ok(Self(Owner::Guest(id.to_string()))),
            None => Err(EcommerceError::Unauthorized("owner required".into())),
        }
    }
}

/// Signed-in user of any role.
#[derive(Debug, Clone, Copy)]
pub struct UserCtx(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for UserCtx {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_claims(parts, &state.auth)?
            .map(|c| Self(c.sub))
            .ok_or_else(|| EcommerceError::Unauthorized("authentication required".into()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdminCtx(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AdminCtx {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_claims(parts, &state.auth)? {
            Some(Claims { sub, role: Role::Admin, .. }) => Ok(Self(sub)),
            Some(_) => Err(EcommerceError::Forbidden),
            None => Err(EcommerceError::Unauthorized("authentication required".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies() {
        let keys = JwtKeys::new(&SecretString::from("s3cret".to_string()));
        let user = Uuid::new_v4();
        let token = keys.issue(user, Role::Admin, chrono::Duration::minutes(5)).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!((claims.sub, claims.role), (user, Role::Admin));
    }

    #[test]
    fn test_foreign_and_expired_tokens_rejected() {
        let keys = JwtKeys::new(&SecretString::from("s3cret".to_string()));
        let other = JwtKeys::new(&SecretString::from("other".to_string()));
        let token = other.issue(Uuid::new_v4(), Role::User, chrono::Duration::minutes(5)).unwrap();
        assert!(keys.verify(&token).is_err());

        let expired = keys.issue(Uuid::new_v4(), Role::User, chrono::Duration::hours(-1)).unwrap();
        assert!(keys.verify(&expired).is_err());
    }
}
