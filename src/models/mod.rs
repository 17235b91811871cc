//! Core data model for the image CRUD service.
//!
//! The sole entity is the image record: a pointer to a blob held by the
//! external object-storage provider. It maps to the database via
//! `sqlx::FromRow` and serializes naturally as JSON via `serde`.

pub mod image;
