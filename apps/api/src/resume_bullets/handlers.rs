//! Axum route handlers for saved resume bullets.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::cover_letters::handlers::DEFAULT_AI_SERVICE;
use crate::errors::AppError;
use crate::jobs::handlers::{blank_to_none, UserIdQuery};
use crate::models::resume_bullet::ResumeBulletRow;
use crate::state::AppState;

fn default_generated() -> bool {
    true
}

/// One bullet via `bullet_text`, or a batch via `bullets`.
#[derive(Debug, Deserialize)]
pub struct BulletForm {
    pub user_id: Uuid,
    pub bullet_text: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
    pub job_id: Option<Uuid>,
    pub job_description: Option<String>,
    #[serde(default = "default_generated")]
    pub is_generated: bool,
    pub ai_service: Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct BulletPatch {
    pub user_id: Uuid,
    pub bullet_text: Option<String>,
    pub job_id: Option<Uuid>,
    pub job_description: Option<String>,
}

/// Batch delete: `ids` is a comma-separated list.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteQuery {
    pub user_id: Uuid,
    pub ids: String,
}

impl BulletForm {
    /// Trimmed bullet texts to insert. Blank entries are an error.
    fn texts(&self) -> Result<Vec<String>, AppError> {
        let texts: Vec<String> = self
            .bullet_text
            .iter()
            .chain(self.bullets.iter())
            .map(|text| text.trim().to_string())
            .collect();

        if texts.is_empty() {
            return Err(AppError::Validation(
                "bullet_text or bullets is required".to_string(),
            ));
        }
        if texts.iter().any(String::is_empty) {
            return Err(AppError::Validation("bullet_text cannot be empty".to_string()));
        }
        Ok(texts)
    }

    fn ai_service(&self) -> Option<String> {
        if !self.is_generated {
            return None;
        }
        blank_to_none(self.ai_service.clone()).or_else(|| Some(DEFAULT_AI_SERVICE.to_string()))
    }
}

impl BulletPatch {
    fn validate(&self) -> Result<(), AppError> {
        if self.bullet_text.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(AppError::Validation("bullet_text cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl BulkDeleteQuery {
    fn parse_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let ids = self
            .ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                Uuid::parse_str(id)
                    .map_err(|_| AppError::Validation(format!("'{id}' is not a valid UUID")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if ids.is_empty() {
            return Err(AppError::Validation("ids cannot be empty".to_string()));
        }
        Ok(ids)
    }
}

/// GET /api/v1/resume-bullets
pub async fn handle_list_bullets(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeBulletRow>>, AppError> {
    let bullets = sqlx::query_as::<_, ResumeBulletRow>(
        "SELECT * FROM resume_bullets WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(bullets))
}

/// POST /api/v1/resume-bullets
///
/// Inserts every bullet in one statement and returns the stored rows.
pub async fn handle_create_bullets(
    State(state): State<AppState>,
    Json(form): Json<BulletForm>,
) -> Result<(StatusCode, Json<Vec<ResumeBulletRow>>), AppError> {
    let texts = form.texts()?;
    let ai_service = form.ai_service();

    let bullets = sqlx::query_as::<_, ResumeBulletRow>(
        r#"
        INSERT INTO resume_bullets
            (user_id, job_id, bullet_text, job_description, is_generated, ai_service)
        SELECT $1, $2, text, $4, $5, $6 FROM UNNEST($3::text[]) AS text
        RETURNING *
        "#,
    )
    .bind(form.user_id)
    .bind(form.job_id)
    .bind(&texts)
    .bind(blank_to_none(form.job_description))
    .bind(form.is_generated)
    .bind(ai_service)
    .fetch_all(&state.db)
    .await?;

    info!("Saved {} resume bullets for user {}", bullets.len(), form.user_id);
    Ok((StatusCode::CREATED, Json(bullets)))
}

/// GET /api/v1/resume-bullets/:id
pub async fn handle_get_bullet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeBulletRow>, AppError> {
    let bullet = sqlx::query_as::<_, ResumeBulletRow>(
        "SELECT * FROM resume_bullets WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(params.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Resume bullet {id} not found")))?;

    Ok(Json(bullet))
}

/// PATCH /api/v1/resume-bullets/:id
pub async fn handle_update_bullet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<BulletPatch>,
) -> Result<Json<ResumeBulletRow>, AppError> {
    patch.validate()?;

    let bullet = sqlx::query_as::<_, ResumeBulletRow>(
        r#"
        UPDATE resume_bullets SET
            bullet_text     = COALESCE($3, bullet_text),
            job_id          = COALESCE($4, job_id),
            job_description = COALESCE($5, job_description),
            updated_at      = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.user_id)
    .bind(patch.bullet_text.as_deref().map(str::trim))
    .bind(patch.job_id)
    .bind(blank_to_none(patch.job_description))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Resume bullet {id} not found")))?;

    Ok(Json(bullet))
}

/// DELETE /api/v1/resume-bullets/:id
pub async fn handle_delete_bullet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM resume_bullets WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Resume bullet {id} not found")));
    }

    info!("Deleted resume bullet {id} for user {}", params.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/resume-bullets?user_id=..&ids=a,b
///
/// Ids that do not exist or belong to another user are skipped.
pub async fn handle_delete_bullets(
    State(state): State<AppState>,
    Query(params): Query<BulkDeleteQuery>,
) -> Result<StatusCode, AppError> {
    let ids = params.parse_ids()?;

    let result = sqlx::query("DELETE FROM resume_bullets WHERE user_id = $1 AND id = ANY($2)")
        .bind(params.user_id)
        .bind(&ids)
        .execute(&state.db)
        .await?;

    info!(
        "Deleted {} of {} resume bullets for user {}",
        result.rows_affected(),
        ids.len(),
        params.user_id
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(json: serde_json::Value) -> BulletForm {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_single_and_batch_bullets_are_combined() {
        let form = form(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "bullet_text": " Cut p99 latency by 40% ",
            "bullets": ["Led migration to Postgres"]
        }));
        assert_eq!(
            form.texts().unwrap(),
            vec!["Cut p99 latency by 40%", "Led migration to Postgres"]
        );
        assert_eq!(form.ai_service().as_deref(), Some(DEFAULT_AI_SERVICE));
    }

    #[test]
    fn test_form_without_bullets_is_rejected() {
        let form = form(serde_json::json!({ "user_id": Uuid::new_v4() }));
        assert!(matches!(form.texts(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_bullet_in_batch_is_rejected() {
        let form = form(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "bullets": ["Shipped v2", "  "]
        }));
        assert!(form.texts().is_err());
    }

    #[test]
    fn test_bulk_delete_ids_are_parsed() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let query = BulkDeleteQuery {
            user_id: Uuid::new_v4(),
            ids: format!("{a}, {b},"),
        };
        assert_eq!(query.parse_ids().unwrap(), vec![a, b]);

        let bad = BulkDeleteQuery {
            user_id: Uuid::new_v4(),
            ids: format!("{a},nope"),
        };
        assert!(bad.parse_ids().is_err());

        let empty = BulkDeleteQuery {
            user_id: Uuid::new_v4(),
            ids: " , ".to_string(),
        };
        assert!(empty.parse_ids().is_err());
    }

    #[test]
    fn test_patch_rejects_blank_text() {
        let patch: BulletPatch = serde_json::from_value(
            serde_json::json!({ "user_id": Uuid::new_v4(), "bullet_text": "" }),
        )
        .unwrap();
        assert!(patch.validate().is_err());
    }
}
