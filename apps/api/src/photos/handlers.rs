//! Axum route handlers for the Photos API.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::photo::PhotoRow;
use crate::multipart::collect_form;
use crate::photos::artifacts::{ArtifactStore, StoreError, STORED_URL_TTL};
use crate::photos::options::GenerationOptions;
use crate::photos::orchestrator::{
    GenerationOutcome, GenerationRequest, GenerationTask, SourceArtifact,
};
use crate::photos::records::{
    delete_photo, find_photo, insert_photo, list_photos, record_generation, NewPhoto,
};
use crate::state::AppState;

/// Largest accepted upload body for photos and resumes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EnhancePhotoRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePhotoRequest {
    pub user_id: Uuid,
    pub options: Option<GenerationOptions>,
}

/// A photo as returned to clients, with read URLs signed for this response.
#[derive(Debug, Serialize)]
pub struct PhotoView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Option<Uuid>,
    pub original_url: String,
    pub enhanced_url: Option<String>,
    pub storage_path: String,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub is_enhanced: bool,
    pub enhancement_service: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub output_url: String,
    pub service: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<GenerationOutcome> for GenerationResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        let message = if outcome.degraded {
            Some("Generation skipped - image provider not configured".to_string())
        } else if outcome.stored_path.is_none() {
            Some("Generated image could not be stored; link expires soon".to_string())
        } else {
            None
        };

        Self {
            output_url: outcome.output_url,
            service: outcome.service,
            degraded: outcome.degraded,
            message,
        }
    }
}

/// Signs fresh read URLs for a stored photo.
pub async fn present_photo(store: &dyn ArtifactStore, row: PhotoRow) -> Result<PhotoView, StoreError> {
    let original_url = store.signed_url(&row.storage_path, STORED_URL_TTL).await?;
    let enhanced_url = match row.enhanced_path.as_deref() {
        Some(path) => Some(store.signed_url(path, STORED_URL_TTL).await?),
        None => row.enhanced_url,
    };

    Ok(PhotoView {
        id: row.id,
        user_id: row.user_id,
        job_id: row.job_id,
        original_url,
        enhanced_url,
        storage_path: row.storage_path,
        file_name: row.file_name,
        file_size: row.file_size,
        mime_type: row.mime_type,
        is_enhanced: row.is_enhanced,
        enhancement_service: row.enhancement_service,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Removes a photo's stored objects. The original must go; the generated
/// copy is best-effort.
pub async fn remove_artifacts(store: &dyn ArtifactStore, photo: &PhotoRow) -> Result<(), StoreError> {
    store.delete(&photo.storage_path).await?;

    if let Some(path) = photo
        .enhanced_path
        .as_deref()
        .filter(|path| *path != photo.storage_path)
    {
        if let Err(e) = store.delete(path).await {
            warn!("Left generated image of photo {} behind: {e}", photo.id);
        }
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/photos
pub async fn handle_list_photos(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PhotoView>>, AppError> {
    let rows = list_photos(&state.db, params.user_id).await?;

    let mut photos = Vec::with_capacity(rows.len());
    for row in rows {
        photos.push(present_photo(state.artifacts.as_ref(), row).await?);
    }
    Ok(Json(photos))
}

/// POST /api/v1/photos
///
/// Multipart upload with `user_id`, `file` and optional `job_id`.
pub async fn handle_upload_photo(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoView>), AppError> {
    let form = collect_form(multipart).await?;

    let user_id = parse_uuid_field(form.text("user_id"), "user_id")?
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let job_id = parse_uuid_field(form.text("job_id"), "job_id")?;
    let file = form.require_file()?;

    if !file.content_type.starts_with("image/") {
        return Err(AppError::Validation(
            "Only image uploads are supported for photos".to_string(),
        ));
    }

    let storage_path = format!(
        "{user_id}/{}-{}.{}",
        Utc::now().timestamp_millis(),
        &Uuid::new_v4().simple().to_string()[..8],
        file.extension()
    );
    let file_size = file.bytes.len() as i64;

    state
        .artifacts
        .upload(&storage_path, file.bytes.clone(), &file.content_type)
        .await?;

    let inserted = insert_photo(
        &state.db,
        NewPhoto {
            user_id,
            job_id,
            storage_path: &storage_path,
            file_name: &file.file_name,
            file_size,
            mime_type: &file.content_type,
        },
    )
    .await;
    let photo = match inserted {
        Ok(photo) => photo,
        Err(e) => {
            if let Err(cleanup) = state.artifacts.delete(&storage_path).await {
                warn!("Left orphaned upload {storage_path} behind: {cleanup}");
            }
            return Err(e.into());
        }
    };

    info!("Uploaded photo {} for user {user_id}", photo.id);
    let view = present_photo(state.artifacts.as_ref(), photo).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /api/v1/photos/:id
pub async fn handle_delete_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let photo = load_photo(&state, photo_id, params.user_id).await?;

    remove_artifacts(state.artifacts.as_ref(), &photo).await?;
    if !delete_photo(&state.db, photo_id, params.user_id).await? {
        return Err(AppError::NotFound(format!("Photo {photo_id} not found")));
    }

    info!("Deleted photo {photo_id} for user {}", params.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/photos/:id/enhance
pub async fn handle_enhance_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
    Json(request): Json<EnhancePhotoRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    let photo = load_photo(&state, photo_id, request.user_id).await?;
    run_generation(&state, &photo, GenerationTask::Enhance).await
}

/// POST /api/v1/photos/:id/generate
///
/// Blocks until the provider finishes, fails, or the poll budget runs out.
pub async fn handle_generate_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
    Json(request): Json<GeneratePhotoRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    let options = request
        .options
        .ok_or_else(|| AppError::Validation("Generation options are required".to_string()))?;
    let photo = load_photo(&state, photo_id, request.user_id).await?;
    run_generation(&state, &photo, GenerationTask::Headshot(options)).await
}

async fn load_photo(state: &AppState, photo_id: Uuid, user_id: Uuid) -> Result<PhotoRow, AppError> {
    find_photo(&state.db, photo_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Photo {photo_id} not found")))
}

async fn run_generation(
    state: &AppState,
    photo: &PhotoRow,
    task: GenerationTask,
) -> Result<Json<GenerationResponse>, AppError> {
    let request = GenerationRequest {
        record_id: photo.id,
        source: SourceArtifact {
            storage_path: photo.storage_path.clone(),
        },
        task,
    };

    let cancel = state.shutdown.child_token();
    let outcome = state.orchestrator.run(&request, &cancel).await?;

    let provider_url = outcome
        .stored_path
        .is_none()
        .then_some(outcome.output_url.as_str());
    if let Err(e) = record_generation(
        &state.db,
        photo.id,
        outcome.stored_path.as_deref(),
        provider_url,
        outcome.service,
    )
    .await
    {
        warn!("Generated photo {} but failed to update its record: {e}", photo.id);
    }

    Ok(Json(outcome.into()))
}

fn parse_uuid_field(value: Option<&str>, field: &str) -> Result<Option<Uuid>, AppError> {
    value
        .map(|v| {
            Uuid::parse_str(v)
                .map_err(|_| AppError::Validation(format!("{field} must be a valid UUID")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photos::orchestrator::DEGRADED_SERVICE;
    use crate::photos::testing::FakeStore;

    fn row(enhanced_path: Option<&str>, enhanced_url: Option<&str>) -> PhotoRow {
        PhotoRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            job_id: None,
            storage_path: "u1/photo.jpg".to_string(),
            enhanced_path: enhanced_path.map(String::from),
            enhanced_url: enhanced_url.map(String::from),
            file_name: "photo.jpg".to_string(),
            file_size: Some(1024),
            mime_type: Some("image/jpeg".to_string()),
            is_enhanced: enhanced_path.is_some() || enhanced_url.is_some(),
            enhancement_service: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_degraded_response_is_flagged() {
        let response: GenerationResponse = GenerationOutcome {
            output_url: "https://store/u1/a.jpg".to_string(),
            service: DEGRADED_SERVICE,
            degraded: true,
            stored_path: Some("u1/a.jpg".to_string()),
        }
        .into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["outputUrl"], "https://store/u1/a.jpg");
        assert_eq!(json["degraded"], true);
        assert_eq!(json["service"], "none (development)");
    }

    #[test]
    fn test_real_generation_omits_degraded_flag() {
        let response: GenerationResponse = GenerationOutcome {
            output_url: "https://store/u1/a-enhanced.jpg".to_string(),
            service: "replicate-codeformer",
            degraded: false,
            stored_path: Some("u1/a-enhanced.jpg".to_string()),
        }
        .into();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("degraded").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_generate_request_accepts_missing_options() {
        let json = serde_json::json!({ "user_id": Uuid::new_v4() });
        let request: GeneratePhotoRequest = serde_json::from_value(json).unwrap();
        assert!(request.options.is_none());
    }

    #[test]
    fn test_photo_bodies_use_snake_case_user_id() {
        let json = serde_json::json!({ "userId": Uuid::new_v4() });
        assert!(serde_json::from_value::<EnhancePhotoRequest>(json).is_err());
    }

    #[tokio::test]
    async fn test_presented_photo_urls_are_signed_per_read() {
        let store = FakeStore::default();

        let view = present_photo(&store, row(Some("u1/photo-enhanced.jpg"), None))
            .await
            .unwrap();

        assert_eq!(view.original_url, "https://store.test/u1/photo.jpg?expires=31536000");
        assert_eq!(
            view.enhanced_url.as_deref(),
            Some("https://store.test/u1/photo-enhanced.jpg?expires=31536000")
        );
        let signed = store.signed.lock().unwrap();
        assert_eq!(signed.len(), 2);
        assert!(signed.iter().all(|(_, ttl)| *ttl == STORED_URL_TTL));
    }

    #[tokio::test]
    async fn test_presented_photo_keeps_provider_url_when_nothing_stored() {
        let store = FakeStore::default();

        let view = present_photo(&store, row(None, Some("https://provider.test/out.png")))
            .await
            .unwrap();

        assert_eq!(view.enhanced_url.as_deref(), Some("https://provider.test/out.png"));
        assert_eq!(store.signed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_artifacts_deletes_original_and_generated_copy() {
        let store = FakeStore::default();

        remove_artifacts(&store, &row(Some("u1/photo-enhanced.jpg"), None))
            .await
            .unwrap();

        assert_eq!(
            store.deleted_paths(),
            vec!["u1/photo.jpg".to_string(), "u1/photo-enhanced.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_artifacts_skips_degraded_self_reference() {
        let store = FakeStore::default();

        remove_artifacts(&store, &row(Some("u1/photo.jpg"), None))
            .await
            .unwrap();

        assert_eq!(store.deleted_paths(), vec!["u1/photo.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_artifacts_fails_when_original_cannot_be_deleted() {
        let store = FakeStore::failing_deletes();

        let err = remove_artifacts(&store, &row(None, None)).await.unwrap_err();

        assert!(matches!(err, StoreError::Delete { .. }));
    }

    #[test]
    fn test_parse_uuid_field() {
        assert!(parse_uuid_field(None, "job_id").unwrap().is_none());
        assert!(parse_uuid_field(Some("not-a-uuid"), "job_id").is_err());
        let id = Uuid::new_v4();
        assert_eq!(
            parse_uuid_field(Some(&id.to_string()), "job_id").unwrap(),
            Some(id)
        );
    }
}
