//! API request/response models for authentication.

use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /users/authentication`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticationRequest {
    pub email: String,
    pub password: String,
}

/// Returned by registration and authentication
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub id: UserId,
    /// Session token, sent back as `Authorization: Bearer <token>`
    pub token: String,
}
