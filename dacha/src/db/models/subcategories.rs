//! Database models for subcategories.

use crate::types::{CategoryId, SubcategoryId};

#[derive(Debug, Clone)]
pub struct SubcategoryCreateDBRequest {
    pub name: String,
    pub category_id: CategoryId,
}

/// Database request for updating a subcategory. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct SubcategoryUpdateDBRequest {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// A subcategory together with the name of its parent category
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SubcategoryDBResponse {
    pub id: SubcategoryId,
    pub name: String,
    pub category_id: CategoryId,
    pub category: String,
}
