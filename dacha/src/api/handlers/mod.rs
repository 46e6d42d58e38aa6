//! HTTP request handlers, one module per resource.
//!
//! Handlers validate the request body, run repository calls from [`crate::db::handlers`] and
//! convert rows into the response models in [`crate::api::models`]. Owner-only routes take a
//! [`CurrentUser`](crate::api::models::users::CurrentUser) extractor.
//!
//! Errors are returned as [`crate::errors::Error`], which renders as `{"error": "..."}` with the
//! matching status code.

pub mod ads;
pub mod categories;
pub mod subcategories;
pub mod users;
