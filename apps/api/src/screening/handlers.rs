//! Axum route handlers for the Screening API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::screening::models::{JobDescription, ResumeFile, ScreeningBatchResult};
use crate::screening::skills::SkillSet;
use crate::state::AppState;

const DEFAULT_MIME: &str = "application/octet-stream";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractSkillsRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractSkillsResponse {
    pub skills: SkillSet,
}

/// Parsed screening form, before job-level validation.
#[derive(Debug, Default)]
struct ScreeningUpload {
    job_text: String,
    title: Option<String>,
    files: Vec<ResumeFile>,
}

async fn read_upload(multipart: &mut Multipart, config: &Config) -> Result<ScreeningUpload, AppError> {
    let mut upload = ScreeningUpload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "jobDescription" => upload.job_text = field.text().await?,
            "title" => upload.title = Some(field.text().await?),
            "resumes" => {
                if upload.files.len() >= config.max_files {
                    return Err(AppError::Validation(format!(
                        "at most {} resumes per batch",
                        config.max_files
                    )));
                }
                let original_filename = field.file_name().unwrap_or("resume").to_string();
                let mime_type = field.content_type().unwrap_or(DEFAULT_MIME).to_string();
                let content = field.bytes().await?;
                if content.len() > config.max_file_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "'{original_filename}' exceeds the {} byte limit",
                        config.max_file_bytes
                    )));
                }
                upload.files.push(ResumeFile {
                    content,
                    original_filename,
                    mime_type,
                });
            }
            _ => {
                field.bytes().await?;
            }
        }
    }

    Ok(upload)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screening
///
/// Multipart form: `jobDescription` (text), optional `title`, and 1..N `resumes` files.
/// Per-resume failures come back as `status: "error"` rows inside a 200 response.
pub async fn handle_screen(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScreeningBatchResult>, AppError> {
    let upload = read_upload(&mut multipart, &state.config).await?;

    if upload.job_text.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription cannot be empty".to_string(),
        ));
    }
    if upload.files.is_empty() {
        return Err(AppError::Validation(
            "at least one resume file is required".to_string(),
        ));
    }

    let job = JobDescription::new(upload.title, upload.job_text);
    let result = state.screener.screen_batch(job, upload.files).await;

    info!(
        batch_id = %result.batch_id,
        candidates = result.candidates.len(),
        "Screening request completed"
    );

    Ok(Json(result))
}

/// POST /api/v1/skills/extract
///
/// Normalized skill set for a free-form job description or profile.
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    Json(request): Json<ExtractSkillsRequest>,
) -> Result<Json<ExtractSkillsResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let skills = state.screener.extractor().extract_skills(&request.text).await;

    Ok(Json(ExtractSkillsResponse { skills }))
}
