//! Defines routes for the image CRUD API.
//!
//! ## Structure
//! - `GET    /`            — static endpoint catalog
//! - `POST   /upload`      — multipart upload (form-data field `image`)
//! - `GET    /images`      — list all records, newest first
//! - `DELETE /images/{id}` — delete record and its remote blob
//!
//! Plus the health endpoints `/healthz` and `/readyz`.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        image_handlers::{delete_image, list_images, root_info, upload_image},
    },
    services::image_service::ImageService,
};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Build and return the router for the whole HTTP surface.
///
/// The router carries shared state (`ImageService`) to all handlers.
pub fn routes() -> Router<ImageService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // image CRUD
        .route("/", get(root_info))
        .route("/upload", post(upload_image))
        .route("/images", get(list_images))
        .route("/images/{id}", delete(delete_image))
}
