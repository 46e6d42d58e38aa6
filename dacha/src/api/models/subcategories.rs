//! API request/response models for subcategories.

use super::pagination::Pagination;
use super::validation;
use crate::db::models::subcategories::SubcategoryDBResponse;
use crate::errors::Result;
use crate::types::{CategoryId, SubcategoryId};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /subcategories` and `PUT /subcategories/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubcategoryCreate {
    /// Name of the parent category
    pub category: String,
    pub name: String,
}

impl SubcategoryCreate {
    pub fn validate(&self) -> Result<()> {
        validation::required("category", &self.category)?;
        validation::required("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubcategoryResponse {
    pub id: SubcategoryId,
    pub name: String,
    pub category_id: CategoryId,
    /// Name of the parent category
    pub category: String,
}

impl From<SubcategoryDBResponse> for SubcategoryResponse {
    fn from(db: SubcategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            category_id: db.category_id,
            category: db.category,
        }
    }
}

/// Query parameters for listing subcategories
#[serde_as]
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListSubcategoriesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only subcategories of this category
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}
