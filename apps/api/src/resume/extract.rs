//! Turns an uploaded resume file into plain text.
//!
//! PDFs are read locally with `pdf-extract`. Images go through the vision
//! model, which transcribes them.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::multipart::UploadedFile;

const OCR_MAX_TOKENS: u32 = 4000;

const OCR_INSTRUCTION: &str = "Extract all text from this resume image. Preserve the structure \
and formatting as much as possible using plain text. Include all sections like contact \
information, experience, education, skills, etc. Return ONLY the extracted text, no additional \
commentary.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionSource {
    Pdf,
    ImageOcr,
}

#[derive(Debug, Serialize)]
pub struct ExtractedResume {
    pub text: String,
    pub source: ExtractionSource,
}

/// How an upload will be read, decided from its declared content type.
#[derive(Debug, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Image(&'static str),
}

impl ResumeFormat {
    pub fn detect(content_type: &str) -> Result<Self, AppError> {
        match content_type {
            "application/pdf" => Ok(Self::Pdf),
            "image/jpeg" | "image/jpg" => Ok(Self::Image("image/jpeg")),
            "image/png" => Ok(Self::Image("image/png")),
            "image/gif" => Ok(Self::Image("image/gif")),
            "image/webp" => Ok(Self::Image("image/webp")),
            other if other.starts_with("image/") => Err(AppError::Validation(
                "Unsupported image format. Please use PNG, JPEG, WebP, or GIF.".to_string(),
            )),
            _ => Err(AppError::Validation(
                "Unsupported file type. Please upload a PDF or image (PNG, JPEG, WebP, GIF)."
                    .to_string(),
            )),
        }
    }
}

pub async fn extract_pdf(file: &UploadedFile) -> Result<ExtractedResume, AppError> {
    let bytes = file.bytes.clone();
    // pdf-extract can panic on malformed input; a panicked task counts as a parse failure.
    let parsed = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await
    .unwrap_or_else(|e| Err(format!("extraction task failed: {e}")));

    let text = match parsed {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("PDF parsing failed for '{}': {e}", file.file_name);
            return Err(AppError::Validation(
                "Failed to parse PDF. Please try pasting the text manually or uploading an image."
                    .to_string(),
            ));
        }
    };

    if text.is_empty() {
        return Err(AppError::Validation(
            "Could not extract text from PDF. The PDF may be image-based. Try uploading a screenshot instead."
                .to_string(),
        ));
    }

    info!("Extracted {} chars from PDF '{}'", text.len(), file.file_name);
    Ok(ExtractedResume {
        text,
        source: ExtractionSource::Pdf,
    })
}

pub async fn extract_image(
    llm: &LlmClient,
    file: &UploadedFile,
    media_type: &str,
) -> Result<ExtractedResume, AppError> {
    let encoded = STANDARD.encode(&file.bytes);
    let text = llm
        .complete_with_image(media_type, &encoded, OCR_INSTRUCTION, OCR_MAX_TOKENS)
        .await?;

    info!("Transcribed {} chars from image '{}'", text.len(), file.file_name);
    Ok(ExtractedResume {
        text,
        source: ExtractionSource::ImageOcr,
    })
}
