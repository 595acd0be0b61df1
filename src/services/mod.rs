// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod admin;
pub mod assignment;
pub mod credential;
pub mod rotation;

pub use account::{AccountService, LoginError};
pub use admin::AdminService;
pub use assignment::{AssignmentResult, CredentialStatus, RotationAlert, Snapshot};
pub use credential::CredentialService;
