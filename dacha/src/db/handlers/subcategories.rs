//! Database repository for subcategories.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::subcategories::{SubcategoryCreateDBRequest, SubcategoryDBResponse, SubcategoryUpdateDBRequest},
};
use crate::types::{CategoryId, SubcategoryId};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;

/// Every read goes through the join so responses carry the category name.
const SUBCATEGORY_SELECT: &str = r#"
    SELECT s.id, s.name, s.category_id, c.name AS category
    FROM subcategories s
    JOIN categories c ON c.id = s.category_id
"#;

/// Filter for listing subcategories
#[derive(Debug, Clone)]
pub struct SubcategoryFilter {
    pub skip: i64,
    pub limit: i64,
    pub category_id: Option<CategoryId>,
}

impl SubcategoryFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            category_id: None,
        }
    }
}

pub struct Subcategories<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Subcategories<'c> {
    type CreateRequest = SubcategoryCreateDBRequest;
    type UpdateRequest = SubcategoryUpdateDBRequest;
    type Response = SubcategoryDBResponse;
    type Id = SubcategoryId;
    type Filter = SubcategoryFilter;

    #[instrument(skip(self, request), fields(name = %request.name, category_id = request.category_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let subcategory = sqlx::query_as::<_, SubcategoryDBResponse>(
            r#"
            WITH inserted AS (
                INSERT INTO subcategories (name, category_id) VALUES ($1, $2)
                RETURNING id, name, category_id
            )
            SELECT i.id, i.name, i.category_id, c.name AS category
            FROM inserted i
            JOIN categories c ON c.id = i.category_id
            "#,
        )
        .bind(&request.name)
        .bind(request.category_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subcategory)
    }

    #[instrument(skip(self), fields(subcategory_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let subcategory = sqlx::query_as::<_, SubcategoryDBResponse>(&format!("{SUBCATEGORY_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(subcategory)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<SubcategoryId>) -> Result<HashMap<Self::Id, SubcategoryDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let subcategories = sqlx::query_as::<_, SubcategoryDBResponse>(&format!("{SUBCATEGORY_SELECT} WHERE s.id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(subcategories.into_iter().map(|s| (s.id, s)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let subcategories = sqlx::query_as::<_, SubcategoryDBResponse>(&format!(
            "{SUBCATEGORY_SELECT} WHERE ($3::BIGINT IS NULL OR s.category_id = $3) ORDER BY s.id LIMIT $1 OFFSET $2"
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .bind(filter.category_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(subcategories)
    }

    /// Fails with [`DbError::ProtectedEntity`] while advertisements still use the subcategory.
    #[instrument(skip(self), fields(subcategory_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subcategories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await
            .map_err(|e| DbError::from(e).protect_on_delete("subcategory", id, "advertisements"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(subcategory_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let subcategory = sqlx::query_as::<_, SubcategoryDBResponse>(
            r#"
            WITH updated AS (
                UPDATE subcategories SET
                    name = COALESCE($2, name),
                    category_id = COALESCE($3, category_id)
                WHERE id = $1
                RETURNING id, name, category_id
            )
            SELECT u.id, u.name, u.category_id, c.name AS category
            FROM updated u
            JOIN categories c ON c.id = u.category_id
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(request.category_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(subcategory)
    }
}

impl<'c> Subcategories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a subcategory by its name within the category of the given name.
    #[instrument(skip(self), err)]
    pub async fn get_by_names(&mut self, category: &str, name: &str) -> Result<Option<SubcategoryDBResponse>> {
        let subcategory = sqlx::query_as::<_, SubcategoryDBResponse>(&format!(
            "{SUBCATEGORY_SELECT} WHERE c.name = $1 AND s.name = $2"
        ))
        .bind(category)
        .bind(name)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(subcategory)
    }
}
