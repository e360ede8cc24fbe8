//! Axum route handlers for job records.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRow, JobStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct JobForm {
    pub user_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub job_description: Option<String>,
    pub application_url: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    pub applied_at: Option<NaiveDate>,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct JobPatch {
    pub user_id: Uuid,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub application_url: Option<String>,
    pub status: Option<JobStatus>,
    pub applied_at: Option<NaiveDate>,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Blank optional text is stored as NULL.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl JobForm {
    fn validate(&self) -> Result<(), AppError> {
        if self.company_name.trim().is_empty() {
            return Err(AppError::Validation("company_name cannot be empty".to_string()));
        }
        if self.job_title.trim().is_empty() {
            return Err(AppError::Validation("job_title cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl JobPatch {
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("company_name", &self.company_name),
            ("job_title", &self.job_title),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs = sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(form): Json<JobForm>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    form.validate()?;

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (user_id, company_name, job_title, job_description, application_url,
             status, applied_at, salary_range, location, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(form.user_id)
    .bind(form.company_name.trim())
    .bind(form.job_title.trim())
    .bind(blank_to_none(form.job_description))
    .bind(blank_to_none(form.application_url))
    .bind(form.status.as_str())
    .bind(form.applied_at)
    .bind(blank_to_none(form.salary_range))
    .bind(blank_to_none(form.location))
    .bind(blank_to_none(form.notes))
    .fetch_one(&state.db)
    .await?;

    info!("Created job {} for user {}", job.id, job.user_id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobRow>, AppError> {
    let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    Ok(Json(job))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<JobRow>, AppError> {
    patch.validate()?;

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs SET
            company_name    = COALESCE($3, company_name),
            job_title       = COALESCE($4, job_title),
            job_description = COALESCE($5, job_description),
            application_url = COALESCE($6, application_url),
            status          = COALESCE($7, status),
            applied_at      = COALESCE($8, applied_at),
            salary_range    = COALESCE($9, salary_range),
            location        = COALESCE($10, location),
            notes           = COALESCE($11, notes),
            updated_at      = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.user_id)
    .bind(patch.company_name.as_deref().map(str::trim))
    .bind(patch.job_title.as_deref().map(str::trim))
    .bind(blank_to_none(patch.job_description))
    .bind(blank_to_none(patch.application_url))
    .bind(patch.status.map(JobStatus::as_str))
    .bind(patch.applied_at)
    .bind(blank_to_none(patch.salary_range))
    .bind(blank_to_none(patch.location))
    .bind(blank_to_none(patch.notes))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }

    info!("Deleted job {id} for user {}", params.user_id);
    Ok(StatusCode::NO_CONTENT)
}
