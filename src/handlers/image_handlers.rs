//! HTTP handlers for the image CRUD endpoints.
//!
//! Each handler is thin glue: validate the request, make one or two
//! collaborator calls through `ImageService`, map the outcome to JSON.
//! Handlers are the final error boundary; nothing below them retries.

use crate::{errors::AppError, models::image::ImageRecord, services::image_service::ImageService};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// `GET /` — static catalog of the available endpoints.
pub async fn root_info() -> impl IntoResponse {
    Json(json!({
        "message": "Simple Image CRUD API",
        "endpoints": {
            "POST": "/upload (form-data: image)",
            "GET": "/images",
            "DELETE": "/images/:id"
        }
    }))
}

/// `POST /upload` — multipart form with a single file field named `image`.
///
/// Other form fields are ignored. A request with no `image` file field is a
/// validation error and never reaches a collaborator.
pub async fn upload_image(
    State(service): State<ImageService>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        // A bare text field named `image` is not a file upload.
        if field.name() != Some("image") || field.file_name().is_none() {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(err.to_string()))?;
        file = Some((content_type, data));
        break;
    }

    let Some((content_type, data)) = file else {
        return Err(AppError::bad_request("No image file provided"));
    };

    let record = service.upload(content_type.as_deref(), data).await?;
    info!(id = %record.id, "Image uploaded");

    Ok(Json(json!({
        "message": "Image uploaded",
        "image": record
    })))
}

/// `GET /images` — every record, newest first. An empty array is success.
pub async fn list_images(
    State(service): State<ImageService>,
) -> Result<Json<Vec<ImageRecord>>, AppError> {
    let records = service.list().await?;
    Ok(Json(records))
}

/// `DELETE /images/{id}` — remove the blob, then the record.
///
/// The id is opaque to callers; one that does not parse is indistinguishable
/// from one that was never issued, so both report 404.
pub async fn delete_image(
    State(service): State<ImageService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::not_found("Image not found"))?;

    service.delete(id).await?;
    info!(%id, "Image deleted");

    Ok(Json(json!({ "message": "Image deleted successfully" })))
}
