use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored photo. Only storage paths are persisted; read URLs are signed per
/// request.
#[derive(Debug, Clone, FromRow)]
pub struct PhotoRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Option<Uuid>,
    pub storage_path: String,
    /// Path of the latest generated version inside the Artifact Store.
    pub enhanced_path: Option<String>,
    /// Provider-hosted URL, set only when the generated image could not be stored.
    pub enhanced_url: Option<String>,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub is_enhanced: bool,
    pub enhancement_service: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
