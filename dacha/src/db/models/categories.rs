//! Database models for categories.

use crate::types::CategoryId;

#[derive(Debug, Clone)]
pub struct CategoryCreateDBRequest {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CategoryUpdateDBRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoryDBResponse {
    pub id: CategoryId,
    pub name: String,
}
