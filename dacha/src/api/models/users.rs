//! API request/response models for users.

use super::validation;
use crate::config::PasswordConfig;
use crate::db::models::users::UserDBResponse;
use crate::errors::Result;
use crate::spatial::{self, Geometry};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /users/registration`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    /// GeoJSON geometry; omitted, `null` or `{}` means no location
    #[serde(default, with = "spatial::optional")]
    #[schema(value_type = Object)]
    pub location: Option<Geometry>,
}

impl UserRegistration {
    pub fn validate(&self, password_config: &PasswordConfig) -> Result<()> {
        validation::required("name", &self.name)?;
        validation::email(&self.email)?;
        validation::password(&self.password, password_config)?;
        validation::required("phone_number", &self.phone_number)?;
        if let Some(location) = &self.location {
            validation::location(location)?;
        }
        Ok(())
    }
}

/// Body of `PUT /users/{id}`. Omitted fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    /// GeoJSON geometry to move to; `{}` removes the location, omitted or `null` keeps it
    #[serde(default, with = "spatial::change", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub location: Option<Option<Geometry>>,
}

impl UserUpdate {
    pub fn validate(&self, password_config: &PasswordConfig) -> Result<()> {
        validation::required_if_present("name", self.name.as_deref())?;
        if let Some(email) = &self.email {
            validation::email(email)?;
        }
        if let Some(password) = &self.password {
            validation::password(password, password_config)?;
        }
        validation::required_if_present("phone_number", self.phone_number.as_deref())?;
        if let Some(Some(location)) = &self.location {
            validation::location(location)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// GeoJSON geometry, `{}` when the user has no location
    #[serde(default, with = "spatial::optional")]
    #[schema(value_type = Object)]
    pub location: Option<Geometry>,
    pub phone_number: String,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            location: db.location.map(|location| location.0),
            phone_number: db.phone_number,
        }
    }
}

/// The user a request is authenticated as, taken from the session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
}

impl From<&UserDBResponse> for CurrentUser {
    fn from(db: &UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email.clone(),
        }
    }
}
