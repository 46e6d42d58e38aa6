//! Database repository for users.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::UserId;
use sqlx::{PgConnection, types::Json};
use std::collections::HashMap;
use tracing::instrument;

/// Columns selected for every user row; the location comes back as GeoJSON.
const USER_COLUMNS: &str =
    "id, name, email, pass_hash, ST_AsGeoJSON(location::geometry)::jsonb AS location, phone_number";

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            INSERT INTO users (name, email, pass_hash, phone_number, location)
            VALUES ($1, $2, $3, $4, ST_GeomFromGeoJSON($5::text)::geography)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.pass_hash)
        .bind(&request.phone_number)
        .bind(request.location.as_ref().map(Json))
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<UserId>) -> Result<HashMap<Self::Id, UserDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }

    /// Advertisements owned by the user go with it (`ON DELETE CASCADE`).
    #[instrument(skip(self), fields(user_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Atomic update with conditional field updates; $7 clears the location
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                pass_hash = COALESCE($4, pass_hash),
                phone_number = COALESCE($5, phone_number),
                location = CASE
                    WHEN $7 THEN NULL
                    ELSE COALESCE(ST_GeomFromGeoJSON($6::text)::geography, location)
                END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.pass_hash)
        .bind(&request.phone_number)
        .bind(request.location.as_ref().and_then(Option::as_ref).map(Json))
        .bind(matches!(request.location, Some(None)))
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{self, Geometry, Value};
    use sqlx::PgPool;

    fn create_request(email: &str, phone_number: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            name: "Olena".to_string(),
            email: email.to_string(),
            pass_hash: "$argon2id$not-a-real-hash".to_string(),
            phone_number: phone_number.to_string(),
            location: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user_with_location(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let mut request = create_request("olena@example.com", "+380501112233");
        request.location = Some(spatial::point(30.5234, 50.4501));

        let user = repo.create(&request).await.unwrap();
        assert_eq!(user.email, "olena@example.com");
        assert_eq!(user.location, Some(Json(spatial::point(30.5234, 50.4501))));

        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.location, user.location);
        assert_eq!(fetched.pass_hash, request.pass_hash);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_without_location(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("nobody@example.com", "1")).await.unwrap();
        assert!(user.location.is_none());

        let found = repo.get_user_by_email("nobody@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("dup@example.com", "1")).await.unwrap();
        let err = repo.create(&create_request("dup@example.com", "2")).await.unwrap_err();

        match err {
            DbError::UniqueViolation {
                table, conflicting_value, ..
            } => {
                assert_eq!(table.as_deref(), Some("users"));
                assert_eq!(conflicting_value.as_deref(), Some("dup@example.com"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_update_keeps_other_columns(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let mut request = create_request("update@example.com", "1");
        request.location = Some(spatial::point(1.0, 2.0));
        let user = repo.create(&request).await.unwrap();

        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    name: Some("Taras".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Taras");
        assert_eq!(updated.email, "update@example.com");
        assert_eq!(updated.location, Some(Json(spatial::point(1.0, 2.0))));

        let missing = repo.update(user.id + 1000, &UserUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_location_with_altitude_round_trips(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let peak = Geometry::new(Value::Point(vec![24.5, 48.16, 2061.0]));
        let mut request = create_request("hiker@example.com", "1");
        request.location = Some(peak.clone());

        let user = repo.create(&request).await.unwrap();
        assert_eq!(user.location, Some(Json(peak.clone())));

        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.location, Some(Json(peak)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_can_clear_location(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let mut request = create_request("mover@example.com", "1");
        request.location = Some(spatial::point(1.0, 2.0));
        let user = repo.create(&request).await.unwrap();

        let moved = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    location: Some(Some(spatial::point(3.0, 4.0))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.location, Some(Json(spatial::point(3.0, 4.0))));

        let cleared = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    location: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.location.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_and_bulk(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let first = repo.create(&create_request("a@example.com", "1")).await.unwrap();
        let second = repo.create(&create_request("b@example.com", "2")).await.unwrap();

        let listed = repo.list(&UserFilter::new(0, 10)).await.unwrap();
        assert_eq!(listed.iter().map(|u| u.id).collect::<Vec<_>>(), vec![first.id, second.id]);

        let page = repo.list(&UserFilter::new(1, 10)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, second.id);

        let bulk = repo.get_bulk(vec![second.id]).await.unwrap();
        assert_eq!(bulk.len(), 1);
        assert!(bulk.contains_key(&second.id));

        assert!(repo.delete(first.id).await.unwrap());
        assert!(!repo.delete(first.id).await.unwrap());
    }
}
