//! Axum route handlers for saved cover letters.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::handlers::{blank_to_none, UserIdQuery};
use crate::models::cover_letter::CoverLetterRow;
use crate::state::AppState;

pub const DEFAULT_AI_SERVICE: &str = "anthropic-claude";

fn default_generated() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterForm {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub job_id: Option<Uuid>,
    pub job_description: Option<String>,
    #[serde(default = "default_generated")]
    pub is_generated: bool,
    pub ai_service: Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct CoverLetterPatch {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub job_id: Option<Uuid>,
    pub job_description: Option<String>,
}

impl CoverLetterForm {
    fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::Validation("content cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Hand-written letters carry no AI service.
    fn ai_service(&self) -> Option<String> {
        if !self.is_generated {
            return None;
        }
        blank_to_none(self.ai_service.clone()).or_else(|| Some(DEFAULT_AI_SERVICE.to_string()))
    }
}

impl CoverLetterPatch {
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [("title", &self.title), ("content", &self.content)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

/// GET /api/v1/cover-letters
pub async fn handle_list_cover_letters(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<CoverLetterRow>>, AppError> {
    let letters = sqlx::query_as::<_, CoverLetterRow>(
        "SELECT * FROM cover_letters WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(letters))
}

/// POST /api/v1/cover-letters
pub async fn handle_create_cover_letter(
    State(state): State<AppState>,
    Json(form): Json<CoverLetterForm>,
) -> Result<(StatusCode, Json<CoverLetterRow>), AppError> {
    form.validate()?;
    let ai_service = form.ai_service();

    let letter = sqlx::query_as::<_, CoverLetterRow>(
        r#"
        INSERT INTO cover_letters
            (user_id, job_id, title, content, job_description, is_generated, ai_service)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(form.user_id)
    .bind(form.job_id)
    .bind(form.title.trim())
    .bind(form.content.trim())
    .bind(blank_to_none(form.job_description))
    .bind(form.is_generated)
    .bind(ai_service)
    .fetch_one(&state.db)
    .await?;

    info!("Saved cover letter {} for user {}", letter.id, letter.user_id);
    Ok((StatusCode::CREATED, Json(letter)))
}

/// GET /api/v1/cover-letters/:id
pub async fn handle_get_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CoverLetterRow>, AppError> {
    let letter = sqlx::query_as::<_, CoverLetterRow>(
        "SELECT * FROM cover_letters WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(params.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Cover letter {id} not found")))?;

    Ok(Json(letter))
}

/// PATCH /api/v1/cover-letters/:id
pub async fn handle_update_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CoverLetterPatch>,
) -> Result<Json<CoverLetterRow>, AppError> {
    patch.validate()?;

    let letter = sqlx::query_as::<_, CoverLetterRow>(
        r#"
        UPDATE cover_letters SET
            title           = COALESCE($3, title),
            content         = COALESCE($4, content),
            job_id          = COALESCE($5, job_id),
            job_description = COALESCE($6, job_description),
            updated_at      = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.user_id)
    .bind(patch.title.as_deref().map(str::trim))
    .bind(patch.content.as_deref().map(str::trim))
    .bind(patch.job_id)
    .bind(blank_to_none(patch.job_description))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Cover letter {id} not found")))?;

    Ok(Json(letter))
}

/// DELETE /api/v1/cover-letters/:id
pub async fn handle_delete_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM cover_letters WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Cover letter {id} not found")));
    }

    info!("Deleted cover letter {id} for user {}", params.user_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_json() -> serde_json::Value {
        serde_json::json!({
            "user_id": Uuid::new_v4(),
            "title": "Cover Letter - Acme",
            "content": "Dear Hiring Manager,"
        })
    }

    #[test]
    fn test_form_defaults_to_generated_with_claude() {
        let form: CoverLetterForm = serde_json::from_value(form_json()).unwrap();
        assert!(form.is_generated);
        assert!(form.validate().is_ok());
        assert_eq!(form.ai_service().as_deref(), Some(DEFAULT_AI_SERVICE));
    }

    #[test]
    fn test_hand_written_letter_has_no_ai_service() {
        let mut json = form_json();
        json["is_generated"] = serde_json::json!(false);
        json["ai_service"] = serde_json::json!("anthropic-claude");
        let form: CoverLetterForm = serde_json::from_value(json).unwrap();
        assert_eq!(form.ai_service(), None);
    }

    #[test]
    fn test_form_rejects_blank_content() {
        let mut json = form_json();
        json["content"] = serde_json::json!("\n  ");
        let form: CoverLetterForm = serde_json::from_value(json).unwrap();
        assert!(matches!(form.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_patch_rejects_blank_title_but_allows_absent() {
        let user_id = Uuid::new_v4();
        let absent: CoverLetterPatch = serde_json::from_value(
            serde_json::json!({ "user_id": user_id, "content": "Updated body" }),
        )
        .unwrap();
        assert!(absent.validate().is_ok());

        let blank: CoverLetterPatch =
            serde_json::from_value(serde_json::json!({ "user_id": user_id, "title": " " }))
                .unwrap();
        assert!(blank.validate().is_err());
    }
}
