use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::multipart::collect_form;
use crate::resume::extract::{extract_image, extract_pdf, ExtractedResume, ResumeFormat};
use crate::state::AppState;

/// POST /api/v1/resume/extract
pub async fn handle_extract_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractedResume>, AppError> {
    let file = collect_form(multipart).await?.require_file()?;

    let extracted = match ResumeFormat::detect(&file.content_type)? {
        ResumeFormat::Pdf => extract_pdf(&file).await?,
        ResumeFormat::Image(media_type) => extract_image(state.llm()?, &file, media_type).await?,
    };
    Ok(Json(extracted))
}
