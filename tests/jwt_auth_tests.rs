// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session format tests.
//!
//! These tests pin the claim layout that `create_jwt` writes, so tokens
//! already held by browsers keep decoding after a deploy.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use eudorama::config::Config;
use eudorama::middleware::auth::{create_jwt, Role};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

mod common;

/// Wire format of the session claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    exp: usize,
    iat: usize,
}

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

#[test]
fn test_jwt_roundtrip() {
    let key = b"test_signing_key_32_bytes_long!!";
    let token = create_jwt("11987654321", Role::Client, 3600, key).unwrap();

    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(key),
        &Validation::new(Algorithm::HS256),
    )
    .expect("Token should decode with the canonical claims");

    assert_eq!(data.claims.sub, "11987654321");
    assert_eq!(data.claims.role, "client");
    assert_eq!(data.claims.exp - data.claims.iat, 3600);
}

#[test]
fn test_admin_role_serialized() {
    let key = b"test_signing_key_32_bytes_long!!";
    let token = create_jwt("maria", Role::Admin, 60, key).unwrap();

    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(key),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap();
    assert_eq!(data.claims.role, "admin");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let config = Config::test_default();
    let now = now_secs();
    // Well past the default 60 s leeway.
    let claims = Claims {
        sub: "11987654321".to_string(),
        role: "client".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&config.jwt_signing_key),
    )
    .unwrap();

    let (app, _, _) = common::create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_without_role_rejected() {
    #[derive(Serialize)]
    struct LegacyClaims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let config = Config::test_default();
    let now = now_secs();
    let token = encode(
        &Header::new(Algorithm::HS256),
        &LegacyClaims {
            sub: "11987654321".to_string(),
            iat: now,
            exp: now + 3600,
        },
        &EncodingKey::from_secret(&config.jwt_signing_key),
    )
    .unwrap();

    let (app, _, _) = common::create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
