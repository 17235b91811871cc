//! Represents a persisted image record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata for one uploaded image.
///
/// The binary payload lives with the external object-storage provider; this
/// record only keeps the pointers needed to serve and later delete it.
/// Records are immutable after insertion — there is no update path, only
/// create, list, and delete.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct ImageRecord {
    /// Unique identifier, generated on insert. External handle for delete.
    pub id: Uuid,

    /// Publicly resolvable URL of the stored image, as returned by the
    /// provider's upload result.
    pub url: String,

    /// The provider's internal reference for the blob. Required to delete
    /// the blob later; never mutated.
    pub public_id: String,

    /// Insertion timestamp. Only used for sort order on list.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
