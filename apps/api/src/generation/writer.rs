//! Application writer: cover letters and resume bullets generated from a
//! job description and the candidate's resume.
//!
//! Text answers are returned as-is. JSON answers are parsed strictly: the
//! whole answer must match the expected schema, otherwise the call fails.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::generation::prompts::{
    BULLETS_PROMPT_TEMPLATE, BULLETS_SYSTEM_TEMPLATE, COVER_LETTER_PROMPT_TEMPLATE,
    COVER_LETTER_SYSTEM_TEMPLATE, SMART_APPLY_PROMPT_TEMPLATE, SMART_APPLY_SYSTEM_TEMPLATE,
};
use crate::llm_client::prompts::{
    BULLET_GUIDELINES, COVER_LETTER_GUIDELINES, JSON_ONLY_INSTRUCTION,
};
use crate::llm_client::{parse_json_answer, LlmClient, LlmError};

const COVER_LETTER_MAX_TOKENS: u32 = 1500;
const BULLETS_MAX_TOKENS: u32 = 3000;
const SMART_APPLY_MAX_TOKENS: u32 = 4000;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A single tailored resume bullet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedBullet {
    pub bullet: String,
    pub category: String,
    pub relevance: String,
}

/// Request body shared by cover letter and bullet generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    pub job_description: String,
    pub resume: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
}

/// Request body for the one-shot application package.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartApplyRequest {
    pub job_description: String,
    pub resume: String,
    pub company_name: String,
    pub job_title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterDraft {
    pub cover_letter: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletSet {
    pub bullets: Vec<GeneratedBullet>,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPackage {
    pub cover_letter: String,
    pub cover_letter_title: String,
    pub bullets: Vec<GeneratedBullet>,
    pub bullets_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BulletsAnswer {
    bullets: Vec<GeneratedBullet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PackageAnswer {
    cover_letter: String,
    bullets: Vec<GeneratedBullet>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

fn require_text(value: &str, message: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}

impl WriteRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text(&self.job_description, "Job description is required")?;
        require_text(&self.resume, "Resume is required")
    }

    fn company(&self) -> Option<&str> {
        non_blank(self.company_name.as_deref())
    }

    fn title(&self) -> Option<&str> {
        non_blank(self.job_title.as_deref())
    }
}

impl SmartApplyRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text(&self.job_description, "Job description is required")?;
        require_text(&self.resume, "Resume is required")?;
        require_text(&self.company_name, "Company name is required")?;
        require_text(&self.job_title, "Job title is required")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Rejects bullet lists the UI cannot render.
fn check_bullets(bullets: &[GeneratedBullet]) -> Result<(), LlmError> {
    if bullets.is_empty() {
        return Err(LlmError::Schema("no bullets returned".to_string()));
    }
    if let Some(idx) = bullets.iter().position(|b| b.bullet.trim().is_empty()) {
        return Err(LlmError::Schema(format!("bullet {idx} has no text")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Titles and prompts
// ────────────────────────────────────────────────────────────────────────────

pub fn cover_letter_title(company: Option<&str>, job_title: Option<&str>, today: NaiveDate) -> String {
    match (company, job_title) {
        (Some(company), Some(title)) => format!("{title} at {company}"),
        (Some(company), None) => format!("Cover Letter for {company}"),
        (None, Some(title)) => format!("Cover Letter for {title}"),
        (None, None) => format!("Cover Letter - {}", today.format("%Y-%m-%d")),
    }
}

pub fn bullets_title(company: Option<&str>, job_title: Option<&str>, today: NaiveDate) -> String {
    match (company, job_title) {
        (Some(company), Some(title)) => format!("{title} at {company}"),
        (Some(company), None) => format!("Bullets for {company}"),
        (None, Some(title)) => format!("Bullets for {title}"),
        (None, None) => format!("Resume Bullets - {}", today.format("%Y-%m-%d")),
    }
}

fn header(company: Option<&str>, job_title: Option<&str>, position_label: &str) -> String {
    let mut lines = Vec::new();
    if let Some(company) = company {
        lines.push(format!("Company: {company}"));
    }
    if let Some(title) = job_title {
        lines.push(format!("{position_label}: {title}"));
    }
    lines.join("\n")
}

fn cover_letter_prompts(request: &WriteRequest) -> (String, String) {
    let system = COVER_LETTER_SYSTEM_TEMPLATE.replace("{guidelines}", COVER_LETTER_GUIDELINES);
    let prompt = COVER_LETTER_PROMPT_TEMPLATE
        .replace("{header}", &header(request.company(), request.title(), "Position"))
        .replace("{job_description}", request.job_description.trim())
        .replace("{resume}", request.resume.trim());
    (system, prompt)
}

fn bullets_prompts(request: &WriteRequest) -> (String, String) {
    let system = BULLETS_SYSTEM_TEMPLATE
        .replace("{guidelines}", BULLET_GUIDELINES)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION);
    let prompt = BULLETS_PROMPT_TEMPLATE
        .replace(
            "{header}",
            &header(request.company(), request.title(), "Target Position"),
        )
        .replace("{job_description}", request.job_description.trim())
        .replace("{resume}", request.resume.trim());
    (system, prompt)
}

fn smart_apply_prompts(request: &SmartApplyRequest) -> (String, String) {
    let system = SMART_APPLY_SYSTEM_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{cover_letter_guidelines}", COVER_LETTER_GUIDELINES)
        .replace("{bullet_guidelines}", BULLET_GUIDELINES);
    let prompt = SMART_APPLY_PROMPT_TEMPLATE
        .replace("{company}", request.company_name.trim())
        .replace("{job_title}", request.job_title.trim())
        .replace("{job_description}", request.job_description.trim())
        .replace("{resume}", request.resume.trim());
    (system, prompt)
}

fn parse_bullets(text: &str) -> Result<Vec<GeneratedBullet>, LlmError> {
    let answer: BulletsAnswer = parse_json_answer(text)?;
    check_bullets(&answer.bullets)?;
    Ok(answer.bullets)
}

fn parse_package(text: &str) -> Result<PackageAnswer, LlmError> {
    let answer: PackageAnswer = parse_json_answer(text)?;
    if answer.cover_letter.trim().is_empty() {
        return Err(LlmError::Schema("cover letter is empty".to_string()));
    }
    check_bullets(&answer.bullets)?;
    Ok(answer)
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_cover_letter(
    llm: &LlmClient,
    request: &WriteRequest,
    today: NaiveDate,
) -> Result<CoverLetterDraft, AppError> {
    let (system, prompt) = cover_letter_prompts(request);
    let cover_letter = llm
        .complete(&prompt, &system, COVER_LETTER_MAX_TOKENS)
        .await?;

    info!("Generated cover letter ({} chars)", cover_letter.len());

    Ok(CoverLetterDraft {
        cover_letter,
        title: cover_letter_title(request.company(), request.title(), today),
    })
}

pub async fn generate_bullets(
    llm: &LlmClient,
    request: &WriteRequest,
    today: NaiveDate,
) -> Result<BulletSet, AppError> {
    let (system, prompt) = bullets_prompts(request);
    let text = llm.complete(&prompt, &system, BULLETS_MAX_TOKENS).await?;

    let bullets = parse_bullets(&text).map_err(|e| {
        error!("Failed to parse bullet answer: {e}");
        e
    })?;
    info!("Generated {} resume bullets", bullets.len());

    Ok(BulletSet {
        bullets,
        title: bullets_title(request.company(), request.title(), today),
    })
}

pub async fn generate_package(
    llm: &LlmClient,
    request: &SmartApplyRequest,
) -> Result<ApplicationPackage, AppError> {
    let (system, prompt) = smart_apply_prompts(request);
    let text = llm.complete(&prompt, &system, SMART_APPLY_MAX_TOKENS).await?;

    let answer = parse_package(&text).map_err(|e| {
        error!("Failed to parse application package answer: {e}");
        e
    })?;

    let company = request.company_name.trim();
    let job_title = request.job_title.trim();
    info!(
        "Generated application package for {job_title} at {company} ({} bullets)",
        answer.bullets.len()
    );

    Ok(ApplicationPackage {
        cover_letter: answer.cover_letter,
        cover_letter_title: format!("{job_title} at {company}"),
        bullets: answer.bullets,
        bullets_title: format!("Bullets for {job_title} at {company}"),
    })
}
