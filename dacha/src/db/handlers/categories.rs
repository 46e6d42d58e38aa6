//! Database repository for categories.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::categories::{CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest},
};
use crate::types::CategoryId;
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing categories
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    pub skip: i64,
    pub limit: i64,
}

impl CategoryFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Categories<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Categories<'c> {
    type CreateRequest = CategoryCreateDBRequest;
    type UpdateRequest = CategoryUpdateDBRequest;
    type Response = CategoryDBResponse;
    type Id = CategoryId;
    type Filter = CategoryFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, CategoryDBResponse>("INSERT INTO categories (name) VALUES ($1) RETURNING id, name")
            .bind(&request.name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(category)
    }

    #[instrument(skip(self), fields(category_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let category = sqlx::query_as::<_, CategoryDBResponse>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(category)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<CategoryId>) -> Result<HashMap<Self::Id, CategoryDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let categories = sqlx::query_as::<_, CategoryDBResponse>("SELECT id, name FROM categories WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(categories.into_iter().map(|c| (c.id, c)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let categories = sqlx::query_as::<_, CategoryDBResponse>("SELECT id, name FROM categories ORDER BY id LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(categories)
    }

    /// Fails with [`DbError::ProtectedEntity`] while subcategories still point at the category.
    #[instrument(skip(self), fields(category_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await
            .map_err(|e| DbError::from(e).protect_on_delete("category", id, "subcategories"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(category_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, CategoryDBResponse>("UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(&request.name)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(category)
    }
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<CategoryDBResponse>> {
        let category = sqlx::query_as::<_, CategoryDBResponse>("SELECT id, name FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Subcategories;
    use crate::db::models::subcategories::SubcategoryCreateDBRequest;
    use sqlx::PgPool;

    fn named(name: &str) -> CategoryCreateDBRequest {
        CategoryCreateDBRequest { name: name.to_string() }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_category_crud(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let created = repo.create(&named("Transport")).await.unwrap();
        assert_eq!(created.name, "Transport");

        let by_name = repo.get_by_name("Transport").await.unwrap();
        assert_eq!(by_name, Some(created.clone()));

        let renamed = repo
            .update(
                created.id,
                &CategoryUpdateDBRequest {
                    name: "Vehicles".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Vehicles");

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        repo.create(&named("Electronics")).await.unwrap();
        let err = repo.create(&named("Electronics")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_with_subcategories_is_protected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let category = Categories::new(&mut conn).create(&named("Realty")).await.unwrap();

        Subcategories::new(&mut conn)
            .create(&SubcategoryCreateDBRequest {
                name: "Flats".to_string(),
                category_id: category.id,
            })
            .await
            .unwrap();

        let err = Categories::new(&mut conn).delete(category.id).await.unwrap_err();
        assert!(matches!(err, DbError::ProtectedEntity { .. }));
    }
}
