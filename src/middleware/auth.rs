// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session middleware for clients and admins.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "eudorama_token";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Admin,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (client phone number or admin username)
    pub sub: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated client extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub phone_number: String,
}

/// Authenticated admin extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub username: String,
}

/// Cookie first, then `Authorization: Bearer`.
fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn decode_claims(token: &str, signing_key: &[u8]) -> Option<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Middleware that requires a valid client session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(&jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    let claims =
        decode_claims(&token, &state.config.jwt_signing_key).ok_or(StatusCode::UNAUTHORIZED)?;

    if claims.role != Role::Client {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(AuthUser {
        phone_number: claims.sub,
    });

    Ok(next.run(request).await)
}

/// Middleware that requires a valid admin session.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(&jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    let claims =
        decode_claims(&token, &state.config.jwt_signing_key).ok_or(StatusCode::UNAUTHORIZED)?;

    if claims.role != Role::Admin {
        tracing::warn!(sub = %claims.sub, "Client token used on admin route");
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(AuthAdmin {
        username: claims.sub,
    });

    Ok(next.run(request).await)
}

/// Create a JWT for a session lasting `ttl_secs`.
pub fn create_jwt(
    subject: &str,
    role: Role,
    ttl_secs: u64,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: subject.to_string(),
        role,
        iat: now,
        exp: now + ttl_secs as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"unit-test-key";

    #[test]
    fn test_jwt_round_trip_keeps_role() {
        let token = create_jwt("11987654321", Role::Client, 3600, KEY).unwrap();
        let claims = decode_claims(&token, KEY).unwrap();
        assert_eq!(claims.sub, "11987654321");
        assert_eq!(claims.role, Role::Client);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = create_jwt("admin", Role::Admin, 3600, KEY).unwrap();
        assert!(decode_claims(&token, b"other-key").is_none());
    }

    #[test]
    fn test_bearer_header_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(
            session_token(&CookieJar::new(), &headers).as_deref(),
            Some("abc.def")
        );

        headers.insert(header::AUTHORIZATION, "Basic xyz".parse().unwrap());
        assert!(session_token(&CookieJar::new(), &headers).is_none());
    }
}
