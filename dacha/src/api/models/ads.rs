//! API request/response models for advertisements.

use super::pagination::Pagination;
use super::subcategories::SubcategoryResponse;
use super::users::UserResponse;
use super::validation;
use crate::db::models::ads::AdDBResponse;
use crate::errors::{Error, Result};
use crate::spatial::Geometry;
use crate::types::{AdId, SubcategoryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /ads`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdCreate {
    pub title: String,
    pub price: String,
    /// Subcategory name, looked up within `category`
    pub subcategory: String,
    /// Category name
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Email of the user posting the ad
    pub user_email: String,
    pub datetime: DateTime<Utc>,
    /// Picture URLs
    #[serde(default)]
    pub pictures: Vec<String>,
    #[schema(value_type = Object)]
    pub location: Geometry,
}

impl AdCreate {
    pub fn validate(&self) -> Result<()> {
        validation::required("title", &self.title)?;
        validation::required("price", &self.price)?;
        validation::required("subcategory", &self.subcategory)?;
        validation::required("category", &self.category)?;
        validation::required("user_email", &self.user_email)?;
        validation::location(&self.location)
    }
}

/// Body of `PUT /ads/{id}`. Omitted fields keep their current value; `subcategory` and
/// `category` move the ad and must be given together.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdUpdate {
    pub title: Option<String>,
    pub price: Option<String>,
    pub subcategory: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    pub pictures: Option<Vec<String>>,
    #[schema(value_type = Option<Object>)]
    pub location: Option<Geometry>,
}

impl AdUpdate {
    pub fn validate(&self) -> Result<()> {
        validation::required_if_present("title", self.title.as_deref())?;
        validation::required_if_present("price", self.price.as_deref())?;
        self.target_subcategory().transpose()?;
        if let Some(location) = &self.location {
            validation::location(location)?;
        }
        Ok(())
    }

    /// The `(category, subcategory)` names to move the ad to, if any.
    pub fn target_subcategory(&self) -> Option<Result<(&str, &str)>> {
        match (self.category.as_deref(), self.subcategory.as_deref()) {
            (None, None) => None,
            (Some(category), Some(subcategory)) => Some(
                validation::required("category", category)
                    .and_then(|_| validation::required("subcategory", subcategory))
                    .map(|_| (category, subcategory)),
            ),
            _ => Some(Err(Error::bad_request(
                "subcategory and category must be given together",
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdCreated {
    pub id: AdId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdResponse {
    pub id: AdId,
    pub title: String,
    pub price: String,
    pub description: String,
    pub subcategory: SubcategoryResponse,
    pub user: UserResponse,
    pub datetime: DateTime<Utc>,
    pub pictures: Vec<String>,
    #[schema(value_type = Object)]
    pub location: Geometry,
}

impl AdResponse {
    pub fn new(db: AdDBResponse, user: UserResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            price: db.price,
            description: db.description,
            subcategory: db.subcategory.into(),
            user,
            datetime: db.datetime,
            pictures: db.pictures,
            location: db.location,
        }
    }
}

/// Query parameters for listing advertisements
#[serde_as]
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListAdsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only ads posted by this user
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub user_id: Option<UserId>,

    /// Only ads in this subcategory
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub subcategory_id: Option<SubcategoryId>,
}
