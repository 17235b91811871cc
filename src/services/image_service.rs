//! src/services/image_service.rs
//!
//! ImageService — create/list/delete over image records, backed by SQLite
//! for metadata and an external [`ObjectStore`] for the blobs themselves.
//! The two stores are not transactionally bound: a partial failure can leave
//! them diverged, and this service only logs that, it does not repair it.

use crate::models::image::ImageRecord;
use crate::services::object_store::{ObjectStore, ObjectStoreError};
use bytes::Bytes;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Destination grouping on the provider side. Fixed for all uploads.
pub const UPLOAD_FOLDER: &str = "simple-image-crud";

/// Image formats the service accepts, matched against the MIME subtype.
pub const ALLOWED_FORMATS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image not found")]
    NotFound,
    #[error("unsupported image format `{0}`")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Coordination layer between the record store and the object store.
///
/// Holds no per-request state; handlers share one clone per request. Both
/// collaborators are injected at startup so tests can substitute doubles.
#[derive(Clone)]
pub struct ImageService {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Remote blob storage client.
    pub store: Arc<dyn ObjectStore>,
}

impl ImageService {
    pub fn new(db: Arc<SqlitePool>, store: Arc<dyn ObjectStore>) -> Self {
        Self { db, store }
    }

    /// Check an uploaded file's declared content type against the allow-list.
    ///
    /// Only `image/<fmt>` types whose subtype appears in [`ALLOWED_FORMATS`]
    /// pass; a missing content type counts as unsupported.
    fn ensure_format_allowed(content_type: Option<&str>) -> ImageResult<&str> {
        let content_type = content_type
            .ok_or_else(|| ImageError::UnsupportedFormat("<none>".into()))?;
        let format = content_type.strip_prefix("image/").unwrap_or("");
        if ALLOWED_FORMATS.contains(&format) {
            Ok(content_type)
        } else {
            Err(ImageError::UnsupportedFormat(content_type.to_string()))
        }
    }

    /// Upload a blob to the provider and persist its metadata record.
    ///
    /// If the insert fails after a successful upload, one best-effort
    /// compensating blob delete is attempted so the provider is not left
    /// holding an unreferenced blob. No retries either way.
    pub async fn upload(
        &self,
        content_type: Option<&str>,
        data: Bytes,
    ) -> ImageResult<ImageRecord> {
        let content_type = Self::ensure_format_allowed(content_type)?;

        let blob = self.store.upload(UPLOAD_FOLDER, content_type, data).await?;

        let insert_result = sqlx::query_as::<_, ImageRecord>(
            "INSERT INTO images (id, url, public_id, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, url, public_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&blob.url)
        .bind(&blob.public_id)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        match insert_result {
            Ok(record) => {
                debug!(id = %record.id, public_id = %record.public_id, "image record created");
                Ok(record)
            }
            Err(err) => {
                if let Err(cleanup_err) = self.store.delete(&blob.public_id).await {
                    warn!(
                        public_id = %blob.public_id,
                        error = %cleanup_err,
                        "insert failed and compensating blob delete failed; blob is orphaned"
                    );
                }
                Err(ImageError::Sqlx(err))
            }
        }
    }

    /// List all records, newest first.
    pub async fn list(&self) -> ImageResult<Vec<ImageRecord>> {
        let records = sqlx::query_as::<_, ImageRecord>(
            "SELECT id, url, public_id, created_at
             FROM images
             ORDER BY created_at DESC",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(records)
    }

    /// Fetch one record by id.
    async fn fetch(&self, id: Uuid) -> ImageResult<ImageRecord> {
        sqlx::query_as::<_, ImageRecord>(
            "SELECT id, url, public_id, created_at FROM images WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(ImageError::NotFound)
    }

    /// Delete a record and its blob.
    ///
    /// Blob first, record second, no rollback in either direction:
    /// - blob delete fails → the record survives, still pointing at a blob
    ///   that may be gone; the error propagates.
    /// - record delete fails after the blob is gone → the record survives as
    ///   a dangling pointer; logged, then the error propagates.
    /// A concurrent delete that removes the row between our fetch and our
    /// delete is benign and still reported as success.
    pub async fn delete(&self, id: Uuid) -> ImageResult<()> {
        let record = self.fetch(id).await?;

        self.store.delete(&record.public_id).await?;

        let result = match sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    id = %id,
                    public_id = %record.public_id,
                    error = %err,
                    "blob deleted but record delete failed; record now dangles"
                );
                return Err(ImageError::Sqlx(err));
            }
        };

        if result.rows_affected() == 0 {
            debug!(id = %id, "record already removed by a concurrent delete");
        }

        Ok(())
    }
}

#[cfg(test)]
pub mod test_support {
    //! Shared fixtures for service- and handler-level tests.

    use super::*;
    use crate::services::object_store::test_support::MemoryStore;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Fresh in-memory database with the real migration applied.
    /// One connection so every query sees the same memory database.
    pub async fn test_pool() -> Arc<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        let sql = include_str!("../../migrations/0001_init.sql");
        for stmt in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(stmt).execute(&pool).await.expect("migration");
        }
        Arc::new(pool)
    }

    pub async fn test_service() -> (ImageService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let service = ImageService::new(test_pool().await, store.clone());
        (service, store)
    }
}
