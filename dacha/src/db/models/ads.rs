//! Database models for advertisements.

use crate::db::models::subcategories::SubcategoryDBResponse;
use crate::spatial::Geometry;
use crate::types::{AdId, SubcategoryId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating an advertisement
#[derive(Debug, Clone)]
pub struct AdCreateDBRequest {
    pub title: String,
    pub price: String,
    pub subcategory_id: SubcategoryId,
    pub description: String,
    pub user_id: UserId,
    pub datetime: DateTime<Utc>,
    pub pictures: Vec<String>,
    pub location: Geometry,
}

/// Database request for updating an advertisement. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct AdUpdateDBRequest {
    pub title: Option<String>,
    pub price: Option<String>,
    pub subcategory_id: Option<SubcategoryId>,
    pub description: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    pub pictures: Option<Vec<String>>,
    pub location: Option<Geometry>,
}

/// Database response for an advertisement, joined with its subcategory and category.
///
/// The owning user is only referenced by id; callers enrich it with
/// [`Users::get_bulk`](crate::db::handlers::Users).
#[derive(Debug, Clone)]
pub struct AdDBResponse {
    pub id: AdId,
    pub title: String,
    pub price: String,
    pub description: String,
    pub user_id: UserId,
    pub datetime: DateTime<Utc>,
    pub pictures: Vec<String>,
    pub location: Geometry,
    pub subcategory: SubcategoryDBResponse,
}
