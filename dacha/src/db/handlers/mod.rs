//! Repository implementations for database access.
//!
//! Each repository wraps a `PgConnection` (a pooled connection or an open transaction) and
//! implements the [`Repository`] trait for its table:
//!
//! - [`Users`]: accounts, lookup by email for authentication
//! - [`Categories`]: top-level taxonomy, lookup by name
//! - [`Subcategories`]: second-level taxonomy, lookup by category and subcategory name
//! - [`Ads`]: advertisements joined with their subcategory and category
//!
//! ```ignore
//! use dacha::db::handlers::{Repository, Users};
//!
//! let mut conn = pool.acquire().await?;
//! let mut repo = Users::new(&mut conn);
//! let user = repo.get_user_by_email("user@example.com").await?;
//! ```

pub mod ads;
pub mod categories;
pub mod repository;
pub mod subcategories;
pub mod users;

pub use ads::Ads;
pub use categories::Categories;
pub use repository::Repository;
pub use subcategories::Subcategories;
pub use users::Users;
