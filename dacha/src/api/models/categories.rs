//! API request/response models for categories.

use super::validation;
use crate::db::models::categories::CategoryDBResponse;
use crate::errors::Result;
use crate::types::CategoryId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /categories` and `PUT /categories/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCreate {
    pub name: String,
}

impl CategoryCreate {
    pub fn validate(&self) -> Result<()> {
        validation::required("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
}

impl From<CategoryDBResponse> for CategoryResponse {
    fn from(db: CategoryDBResponse) -> Self {
        Self { id: db.id, name: db.name }
    }
}
