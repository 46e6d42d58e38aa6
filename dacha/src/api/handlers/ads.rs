use crate::{
    AppState,
    api::models::{
        ads::{AdCreate, AdCreated, AdResponse, AdUpdate, ListAdsQuery},
        users::{CurrentUser, UserResponse},
    },
    db::{
        errors::DbError,
        handlers::{Ads, Repository, Subcategories, Users, ads::AdFilter},
        models::ads::{AdCreateDBRequest, AdDBResponse, AdUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{AdId, Operation, Resource, SubcategoryId, UserId},
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use sqlx::PgConnection;
use tracing::info;

async fn subcategory_id_by_names(conn: &mut PgConnection, category: &str, subcategory: &str) -> Result<SubcategoryId> {
    Subcategories::new(conn)
        .get_by_names(category, subcategory)
        .await?
        .map(|s| s.id)
        .ok_or_else(|| Error::not_found(Resource::Subcategory, format!("{category}/{subcategory}")))
}

/// Attach the owning user to an advertisement row.
async fn with_user(conn: &mut PgConnection, ad: AdDBResponse) -> Result<AdResponse> {
    let user = Users::new(conn)
        .get_by_id(ad.user_id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::User, ad.user_id))?;
    Ok(AdResponse::new(ad, user.into()))
}

/// Fail unless the advertisement exists and belongs to `current_user`.
async fn ensure_ad_owner(conn: &mut PgConnection, current_user: &CurrentUser, id: AdId, action: Operation) -> Result<()> {
    let owner: UserId = Ads::new(conn)
        .get_owner(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Ad, id))?;
    current_user.ensure_owner(owner, action, Resource::Ad)
}

#[utoipa::path(
    get,
    path = "/ads",
    tag = "ads",
    summary = "List advertisements",
    params(ListAdsQuery),
    responses(
        (status = 200, description = "Advertisements ordered by id, with subcategory and owner", body = Vec<AdResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_ads(State(state): State<AppState>, Query(query): Query<ListAdsQuery>) -> Result<Json<Vec<AdResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let (skip, limit) = query.pagination.params();

    let ads = Ads::new(&mut conn)
        .list(&AdFilter {
            user_id: query.user_id,
            subcategory_id: query.subcategory_id,
            ..AdFilter::new(skip, limit)
        })
        .await?;

    let mut user_ids: Vec<UserId> = ads.iter().map(|ad| ad.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let users = Users::new(&mut conn).get_bulk(user_ids).await?;

    let response = ads
        .into_iter()
        .filter_map(|ad| {
            let user = users.get(&ad.user_id)?.clone();
            Some(AdResponse::new(ad, UserResponse::from(user)))
        })
        .collect();
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/ads/{id}",
    tag = "ads",
    summary = "Get advertisement",
    params(("id" = i64, Path, description = "Advertisement ID")),
    responses(
        (status = 200, description = "The advertisement", body = AdResponse),
        (status = 404, description = "Advertisement not found"),
    )
)]
#[tracing::instrument(skip_all, fields(ad_id = id))]
pub async fn get_ad(State(state): State<AppState>, Path(id): Path<AdId>) -> Result<Json<AdResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let ad = Ads::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Ad, id))?;
    with_user(&mut conn, ad).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/ads",
    tag = "ads",
    summary = "Create advertisement",
    description = "The subcategory is looked up by name within the named category, the owner by email.",
    request_body = AdCreate,
    responses(
        (status = 200, description = "Advertisement created", body = AdCreated),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Rejected by a database constraint"),
        (status = 404, description = "Unknown subcategory or user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_ad(
    State(state): State<AppState>,
    body: std::result::Result<Json<AdCreate>, JsonRejection>,
) -> Result<Json<AdCreated>> {
    let Json(request) = body?;
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subcategory_id = subcategory_id_by_names(&mut conn, &request.category, &request.subcategory).await?;
    let user = Users::new(&mut conn)
        .get_user_by_email(&request.user_email)
        .await?
        .ok_or_else(|| Error::not_found(Resource::User, &request.user_email))?;

    let ad = Ads::new(&mut conn)
        .create(&AdCreateDBRequest {
            title: request.title,
            price: request.price,
            subcategory_id,
            description: request.description,
            user_id: user.id,
            datetime: request.datetime,
            pictures: request.pictures,
            location: request.location,
        })
        .await?;

    metrics::counter!("dacha_ads_created_total").increment(1);
    info!(ad_id = ad.id, user_id = user.id, "Created advertisement");

    Ok(Json(AdCreated { id: ad.id }))
}

#[utoipa::path(
    put,
    path = "/ads/{id}",
    tag = "ads",
    summary = "Update advertisement",
    request_body = AdUpdate,
    params(("id" = i64, Path, description = "Advertisement ID")),
    responses(
        (status = 200, description = "The updated advertisement", body = AdResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the owner, or rejected by a database constraint"),
        (status = 404, description = "Advertisement or target subcategory not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(ad_id = id))]
pub async fn update_ad(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<AdId>,
    body: std::result::Result<Json<AdUpdate>, JsonRejection>,
) -> Result<Json<AdResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    ensure_ad_owner(&mut conn, &current_user, id, Operation::Update).await?;

    let Json(request) = body?;
    request.validate()?;

    let subcategory_id = match request.target_subcategory().transpose()? {
        Some((category, subcategory)) => Some(subcategory_id_by_names(&mut conn, category, subcategory).await?),
        None => None,
    };

    let ad = Ads::new(&mut conn)
        .update(
            id,
            &AdUpdateDBRequest {
                title: request.title,
                price: request.price,
                subcategory_id,
                description: request.description,
                datetime: request.datetime,
                pictures: request.pictures,
                location: request.location,
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::not_found(Resource::Ad, id),
            other => other.into(),
        })?;

    with_user(&mut conn, ad).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/ads/{id}",
    tag = "ads",
    summary = "Delete advertisement",
    params(("id" = i64, Path, description = "Advertisement ID")),
    responses(
        (status = 204, description = "Advertisement deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Advertisement not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(ad_id = id))]
pub async fn delete_ad(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<AdId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    ensure_ad_owner(&mut conn, &current_user, id, Operation::Delete).await?;

    if Ads::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(Resource::Ad, id))
    }
}
