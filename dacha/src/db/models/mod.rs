//! Database record models matching table schemas.
//!
//! Each entity has a create request, an update request and a response type. Requests carry only
//! what the table stores (a password arrives here already hashed, a subcategory already resolved
//! to its id); responses are what repositories hand back.
//!
//! Database models are kept apart from the API models in [`crate::api::models`] so storage and
//! wire representations can change independently. Conversions live on the API side.
//!
//! - [`users`]: accounts, password hashes and optional home locations
//! - [`categories`]: top-level taxonomy
//! - [`subcategories`]: second-level taxonomy, joined with the parent category name
//! - [`ads`]: advertisements, joined with subcategory and category

pub mod ads;
pub mod categories;
pub mod subcategories;
pub mod users;
