//! API request and response data models.
//!
//! These types are the public JSON contract. They are kept apart from the database models in
//! [`crate::db::models`] so either side can change without the other; `From` impls convert rows
//! into responses. Request bodies carry a `validate` method that handlers call before touching
//! the database.

pub mod ads;
pub mod auth;
pub mod categories;
pub mod pagination;
pub mod subcategories;
pub mod users;
pub mod validation;
