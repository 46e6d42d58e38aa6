//! REST API: route handlers and the JSON models they exchange.
//!
//! | Resource        | Routes                                                        |
//! |-----------------|---------------------------------------------------------------|
//! | users           | `/users`, `/users/{id}`, `/users/registration`, `/users/authentication` |
//! | categories      | `/categories`, `/categories/{id}`                             |
//! | subcategories   | `/subcategories`, `/subcategories/{id}`                       |
//! | advertisements  | `/ads`, `/ads/{id}`                                           |
//!
//! The OpenAPI document is served at `/openapi.json` and rendered at `/docs`.

pub mod handlers;
pub mod models;
