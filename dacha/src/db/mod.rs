//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL and PostGIS.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries and joins)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Spatial columns
//!
//! `users.location` and `advertisements.location` are unconstrained `geography` columns, so 2D
//! and 3D geometries of any type fit. Repositories bind [`crate::spatial::Geometry`] values as
//! `jsonb` and convert them with `ST_GeomFromGeoJSON(..)::geography` on the way in and
//! `ST_AsGeoJSON(location::geometry)::jsonb` on the way out.
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/` directory.
//! The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! dacha::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
