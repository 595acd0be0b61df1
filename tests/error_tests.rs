// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use eudorama::error::AppError;
use eudorama::services::LoginError;

fn status_of(err: LoginError) -> StatusCode {
    AppError::from(err).into_response().status()
}

#[test]
fn test_login_errors_map_to_http_status() {
    assert_eq!(status_of(LoginError::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_of(LoginError::AccessRevoked), StatusCode::FORBIDDEN);
    assert_eq!(status_of(LoginError::WrongPassword), StatusCode::UNAUTHORIZED);
    assert_eq!(
        status_of(LoginError::WrongTrialPassword),
        StatusCode::UNAUTHORIZED
    );
}

#[test]
fn test_store_failure_passes_through() {
    let err = LoginError::from(AppError::Database("timeout".to_string()));
    assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_login_error_messages() {
    assert_eq!(
        LoginError::AccessRevoked.to_string(),
        "Access revoked. Please contact support."
    );
    assert_eq!(
        LoginError::Store(AppError::BadRequest("x".to_string())).to_string(),
        "Invalid request: x"
    );
}
