use crate::{
    AppState,
    api::models::{
        categories::{CategoryCreate, CategoryResponse},
        pagination::Pagination,
    },
    db::{
        errors::DbError,
        handlers::{Categories, Repository, categories::CategoryFilter},
        models::categories::{CategoryCreateDBRequest, CategoryUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{CategoryId, Resource},
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    summary = "List categories",
    params(Pagination),
    responses(
        (status = 200, description = "Categories ordered by id", body = Vec<CategoryResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<Pagination>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let (skip, limit) = query.params();

    let categories = Categories::new(&mut conn).list(&CategoryFilter::new(skip, limit)).await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Get category",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "The category", body = CategoryResponse),
        (status = 404, description = "Category not found"),
    )
)]
#[tracing::instrument(skip_all, fields(category_id = id))]
pub async fn get_category(State(state): State<AppState>, Path(id): Path<CategoryId>) -> Result<Json<CategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let category = Categories::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Category, id))?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    summary = "Create category",
    request_body = CategoryCreate,
    responses(
        (status = 200, description = "The created category", body = CategoryResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "A category with this name already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    body: std::result::Result<Json<CategoryCreate>, JsonRejection>,
) -> Result<Json<CategoryResponse>> {
    let Json(request) = body?;
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = Categories::new(&mut conn)
        .create(&CategoryCreateDBRequest { name: request.name })
        .await?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Rename category",
    request_body = CategoryCreate,
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "The updated category", body = CategoryResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "A category with this name already exists"),
        (status = 404, description = "Category not found"),
    )
)]
#[tracing::instrument(skip_all, fields(category_id = id))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    body: std::result::Result<Json<CategoryCreate>, JsonRejection>,
) -> Result<Json<CategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    if repo.get_by_id(id).await?.is_none() {
        return Err(Error::not_found(Resource::Category, id));
    }

    let Json(request) = body?;
    request.validate()?;

    let category = repo
        .update(id, &CategoryUpdateDBRequest { name: request.name })
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::not_found(Resource::Category, id),
            other => other.into(),
        })?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Delete category",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has subcategories"),
    )
)]
#[tracing::instrument(skip_all, fields(category_id = id))]
pub async fn delete_category(State(state): State<AppState>, Path(id): Path<CategoryId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Categories::new(&mut conn).delete(id).await? {
        Ok(StatusCode::OK)
    } else {
        Err(Error::not_found(Resource::Category, id))
    }
}
