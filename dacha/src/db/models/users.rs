//! Database models for users.

use crate::spatial::Geometry;
use crate::types::UserId;
use sqlx::types::Json;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub email: String,
    pub pass_hash: String,
    pub phone_number: String,
    pub location: Option<Geometry>,
}

/// Database request for updating a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub pass_hash: Option<String>,
    pub phone_number: Option<String>,
    /// `Some(None)` clears the stored location.
    pub location: Option<Option<Geometry>>,
}

/// Database response for a user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub pass_hash: String,
    pub location: Option<Json<Geometry>>,
    pub phone_number: String,
}
