use crate::{
    AppState,
    api::models::{
        subcategories::{ListSubcategoriesQuery, SubcategoryCreate, SubcategoryResponse},
    },
    db::{
        errors::DbError,
        handlers::{Categories, Repository, Subcategories, subcategories::SubcategoryFilter},
        models::subcategories::{SubcategoryCreateDBRequest, SubcategoryUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{CategoryId, Resource, SubcategoryId},
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use sqlx::PgConnection;

/// Resolve a category name, refusing names that do not exist.
async fn category_id_by_name(conn: &mut PgConnection, name: &str) -> Result<CategoryId> {
    Categories::new(conn)
        .get_by_name(name)
        .await?
        .map(|category| category.id)
        .ok_or_else(|| Error::Rejected {
            message: format!("Unknown category: {name}"),
        })
}

#[utoipa::path(
    get,
    path = "/subcategories",
    tag = "subcategories",
    summary = "List subcategories",
    params(ListSubcategoriesQuery),
    responses(
        (status = 200, description = "Subcategories ordered by id", body = Vec<SubcategoryResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    Query(query): Query<ListSubcategoriesQuery>,
) -> Result<Json<Vec<SubcategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let (skip, limit) = query.pagination.params();

    let subcategories = Subcategories::new(&mut conn)
        .list(&SubcategoryFilter {
            category_id: query.category_id,
            ..SubcategoryFilter::new(skip, limit)
        })
        .await?;
    Ok(Json(subcategories.into_iter().map(SubcategoryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/subcategories/{id}",
    tag = "subcategories",
    summary = "Get subcategory",
    params(("id" = i64, Path, description = "Subcategory ID")),
    responses(
        (status = 200, description = "The subcategory", body = SubcategoryResponse),
        (status = 404, description = "Subcategory not found"),
    )
)]
#[tracing::instrument(skip_all, fields(subcategory_id = id))]
pub async fn get_subcategory(State(state): State<AppState>, Path(id): Path<SubcategoryId>) -> Result<Json<SubcategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let subcategory = Subcategories::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Subcategory, id))?;
    Ok(Json(subcategory.into()))
}

#[utoipa::path(
    post,
    path = "/subcategories",
    tag = "subcategories",
    summary = "Create subcategory",
    request_body = SubcategoryCreate,
    responses(
        (status = 200, description = "The created subcategory", body = SubcategoryResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Unknown category, or the name is taken within it"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_subcategory(
    State(state): State<AppState>,
    body: std::result::Result<Json<SubcategoryCreate>, JsonRejection>,
) -> Result<Json<SubcategoryResponse>> {
    let Json(request) = body?;
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category_id = category_id_by_name(&mut conn, &request.category).await?;

    let subcategory = Subcategories::new(&mut conn)
        .create(&SubcategoryCreateDBRequest {
            name: request.name,
            category_id,
        })
        .await?;
    Ok(Json(subcategory.into()))
}

#[utoipa::path(
    put,
    path = "/subcategories/{id}",
    tag = "subcategories",
    summary = "Update subcategory",
    description = "Renames the subcategory and moves it into the named category.",
    request_body = SubcategoryCreate,
    params(("id" = i64, Path, description = "Subcategory ID")),
    responses(
        (status = 200, description = "The updated subcategory", body = SubcategoryResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Unknown category, or the name is taken within it"),
        (status = 404, description = "Subcategory not found"),
    )
)]
#[tracing::instrument(skip_all, fields(subcategory_id = id))]
pub async fn update_subcategory(
    State(state): State<AppState>,
    Path(id): Path<SubcategoryId>,
    body: std::result::Result<Json<SubcategoryCreate>, JsonRejection>,
) -> Result<Json<SubcategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Subcategories::new(&mut conn).get_by_id(id).await?.is_none() {
        return Err(Error::not_found(Resource::Subcategory, id));
    }

    let Json(request) = body?;
    request.validate()?;

    let category_id = category_id_by_name(&mut conn, &request.category).await?;

    let subcategory = Subcategories::new(&mut conn)
        .update(
            id,
            &SubcategoryUpdateDBRequest {
                name: Some(request.name),
                category_id: Some(category_id),
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::not_found(Resource::Subcategory, id),
            other => other.into(),
        })?;
    Ok(Json(subcategory.into()))
}

#[utoipa::path(
    delete,
    path = "/subcategories/{id}",
    tag = "subcategories",
    summary = "Delete subcategory",
    params(("id" = i64, Path, description = "Subcategory ID")),
    responses(
        (status = 200, description = "Subcategory deleted"),
        (status = 404, description = "Subcategory not found"),
        (status = 409, description = "Advertisements still use this subcategory"),
    )
)]
#[tracing::instrument(skip_all, fields(subcategory_id = id))]
pub async fn delete_subcategory(State(state): State<AppState>, Path(id): Path<SubcategoryId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Subcategories::new(&mut conn).delete(id).await? {
        Ok(StatusCode::OK)
    } else {
        Err(Error::not_found(Resource::Subcategory, id))
    }
}
