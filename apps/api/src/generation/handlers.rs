//! Axum route handlers for text generation.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::errors::AppError;
use crate::generation::writer::{
    generate_bullets, generate_cover_letter, generate_package, ApplicationPackage, BulletSet,
    CoverLetterDraft, SmartApplyRequest, WriteRequest,
};
use crate::state::AppState;

/// POST /api/v1/cover-letters/generate
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<WriteRequest>,
) -> Result<Json<CoverLetterDraft>, AppError> {
    request.validate()?;
    let llm = state.llm()?;

    let draft = generate_cover_letter(llm, &request, Utc::now().date_naive()).await?;
    Ok(Json(draft))
}

/// POST /api/v1/resume-bullets/generate
pub async fn handle_generate_bullets(
    State(state): State<AppState>,
    Json(request): Json<WriteRequest>,
) -> Result<Json<BulletSet>, AppError> {
    request.validate()?;
    let llm = state.llm()?;

    let set = generate_bullets(llm, &request, Utc::now().date_naive()).await?;
    Ok(Json(set))
}

/// POST /api/v1/jobs/smart-apply
///
/// Cover letter and bullets from a single model call, so both read as one
/// application.
pub async fn handle_smart_apply(
    State(state): State<AppState>,
    Json(request): Json<SmartApplyRequest>,
) -> Result<Json<ApplicationPackage>, AppError> {
    request.validate()?;
    let llm = state.llm()?;

    let package = generate_package(llm, &request).await?;
    Ok(Json(package))
}
