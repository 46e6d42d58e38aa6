//! Database repository for advertisements.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        ads::{AdCreateDBRequest, AdDBResponse, AdUpdateDBRequest},
        subcategories::SubcategoryDBResponse,
    },
};
use crate::spatial::Geometry;
use crate::types::{AdId, CategoryId, SubcategoryId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection, types::Json};
use std::collections::HashMap;
use tracing::instrument;

const AD_SELECT: &str = r#"
    SELECT
        a.id, a.title, a.price, a.description, a.user_id, a.datetime, a.pictures,
        ST_AsGeoJSON(a.location::geometry)::jsonb AS location,
        s.id AS subcategory_id, s.name AS subcategory_name,
        c.id AS category_id, c.name AS category_name
    FROM advertisements a
    JOIN subcategories s ON s.id = a.subcategory_id
    JOIN categories c ON c.id = s.category_id
"#;

/// Filter for listing advertisements
#[derive(Debug, Clone)]
pub struct AdFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
    pub subcategory_id: Option<SubcategoryId>,
}

impl AdFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            user_id: None,
            subcategory_id: None,
        }
    }
}

// Flat row produced by AD_SELECT
#[derive(Debug, FromRow)]
struct AdRow {
    id: AdId,
    title: String,
    price: String,
    description: String,
    user_id: UserId,
    datetime: DateTime<Utc>,
    pictures: Vec<String>,
    location: Json<Geometry>,
    subcategory_id: SubcategoryId,
    subcategory_name: String,
    category_id: CategoryId,
    category_name: String,
}

impl From<AdRow> for AdDBResponse {
    fn from(row: AdRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            price: row.price,
            description: row.description,
            user_id: row.user_id,
            datetime: row.datetime,
            pictures: row.pictures,
            location: row.location.0,
            subcategory: SubcategoryDBResponse {
                id: row.subcategory_id,
                name: row.subcategory_name,
                category_id: row.category_id,
                category: row.category_name,
            },
        }
    }
}

pub struct Ads<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Ads<'c> {
    type CreateRequest = AdCreateDBRequest;
    type UpdateRequest = AdUpdateDBRequest;
    type Response = AdDBResponse;
    type Id = AdId;
    type Filter = AdFilter;

    #[instrument(skip(self, request), fields(user_id = request.user_id, subcategory_id = request.subcategory_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let id: AdId = sqlx::query_scalar(
            r#"
            INSERT INTO advertisements (title, price, subcategory_id, description, user_id, datetime, pictures, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, ST_GeomFromGeoJSON($8::text)::geography)
            RETURNING id
            "#,
        )
        .bind(&request.title)
        .bind(&request.price)
        .bind(request.subcategory_id)
        .bind(&request.description)
        .bind(request.user_id)
        .bind(request.datetime)
        .bind(&request.pictures)
        .bind(Json(&request.location))
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, AdRow>(&format!("{AD_SELECT} WHERE a.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(ad_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, AdRow>(&format!("{AD_SELECT} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<AdId>) -> Result<HashMap<Self::Id, AdDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, AdRow>(&format!("{AD_SELECT} WHERE a.id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows.into_iter().map(|row| (row.id, row.into())).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let rows = sqlx::query_as::<_, AdRow>(&format!(
            r#"
            {AD_SELECT}
            WHERE ($3::BIGINT IS NULL OR a.user_id = $3)
              AND ($4::BIGINT IS NULL OR a.subcategory_id = $4)
            ORDER BY a.id
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .bind(filter.user_id)
        .bind(filter.subcategory_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(ad_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM advertisements WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(ad_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        sqlx::query_scalar::<_, AdId>(
            r#"
            UPDATE advertisements SET
                title = COALESCE($2, title),
                price = COALESCE($3, price),
                subcategory_id = COALESCE($4, subcategory_id),
                description = COALESCE($5, description),
                datetime = COALESCE($6, datetime),
                pictures = COALESCE($7, pictures),
                location = COALESCE(ST_GeomFromGeoJSON($8::text)::geography, location)
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.price)
        .bind(request.subcategory_id)
        .bind(&request.description)
        .bind(request.datetime)
        .bind(&request.pictures)
        .bind(request.location.as_ref().map(Json))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        let row = sqlx::query_as::<_, AdRow>(&format!("{AD_SELECT} WHERE a.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }
}

impl<'c> Ads<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Owner of an advertisement, without loading the rest of the row.
    #[instrument(skip(self), fields(ad_id = id), err)]
    pub async fn get_owner(&mut self, id: AdId) -> Result<Option<UserId>> {
        let owner = sqlx::query_scalar::<_, UserId>("SELECT user_id FROM advertisements WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(owner)
    }
}
