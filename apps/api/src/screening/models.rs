//! Data model shared by every stage of the screening pipeline.
//!
//! JSON shapes use camelCase keys; `ScreeningBatchResult` is the response body
//! of the screening endpoint.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::screening::skills::SkillSet;

/// Error string recorded for resumes whose extracted text is below the minimum length.
pub const EMPTY_TEXT_ERROR: &str = "empty_or_unparsable_text_pdf";

pub const DEFAULT_JOB_TITLE: &str = "Untitled Job";

/// One uploaded resume. Owned by a single screening request.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub content: Bytes,
    pub original_filename: String,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct JobDescription {
    pub title: String,
    pub raw_text: String,
}

impl JobDescription {
    pub fn new(title: Option<String>, raw_text: String) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_JOB_TITLE.to_string());
        Self { title, raw_text }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    #[default]
    None,
    Bachelor,
    Master,
    Phd,
}

impl EducationLevel {
    /// Lenient parse of LLM-provided labels. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        let level = match label.as_str() {
            "none" | "" => EducationLevel::None,
            "bachelor" | "bachelors" | "bachelor's" | "undergraduate" => EducationLevel::Bachelor,
            "master" | "masters" | "master's" | "postgraduate" => EducationLevel::Master,
            "phd" | "ph.d" | "ph.d." | "doctorate" | "doctoral" => EducationLevel::Phd,
            _ => return None,
        };
        Some(level)
    }

    /// Additive education boost in [0, 0.1].
    pub fn boost(self) -> f64 {
        match self {
            EducationLevel::Phd => 0.10,
            EducationLevel::Master => 0.07,
            EducationLevel::Bachelor => 0.03,
            EducationLevel::None => 0.0,
        }
    }
}

/// Structured attributes extracted from one resume. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateExtraction {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_experience: f64,
    pub education_level: EducationLevel,
    pub skills: SkillSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub similarity: f64,
    pub experience_fit: f64,
    pub education_boost: f64,
    /// 0–100 fit score used for ranking.
    #[serde(rename = "final")]
    pub final_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    StrongYes,
    Yes,
    Maybe,
    No,
}

impl Decision {
    /// Threshold bands: ≥85 strong_yes, ≥70 yes, ≥55 maybe, otherwise no.
    pub fn from_score(final_score: u8) -> Self {
        match final_score {
            85..=u8::MAX => Decision::StrongYes,
            70..=84 => Decision::Yes,
            55..=69 => Decision::Maybe,
            _ => Decision::No,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "strong_yes" => Some(Decision::StrongYes),
            "yes" => Some(Decision::Yes),
            "maybe" => Some(Decision::Maybe),
            "no" => Some(Decision::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub decision: Decision,
    pub summary: String,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub questions: Vec<String>,
}

impl Evaluation {
    /// Deterministic evaluation used when the LLM rubric is disabled or unusable.
    pub fn from_score(final_score: u8) -> Self {
        Self {
            decision: Decision::from_score(final_score),
            summary: String::new(),
            strengths: vec![],
            gaps: vec![],
            questions: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Screened,
    Error,
}

/// One row of the batch result. Error rows never carry extraction, scores or evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub original_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<CandidateExtraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    pub status: CandidateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl CandidateResult {
    pub fn screened(
        original_filename: String,
        extraction: CandidateExtraction,
        scores: ScoreBreakdown,
        evaluation: Evaluation,
    ) -> Self {
        Self {
            original_filename,
            extraction: Some(extraction),
            scores: Some(scores),
            evaluation: Some(evaluation),
            status: CandidateStatus::Screened,
            error: None,
            processed_at: Utc::now(),
        }
    }

    pub fn failed(original_filename: String, error: impl Into<String>) -> Self {
        Self {
            original_filename,
            extraction: None,
            scores: None,
            evaluation: None,
            status: CandidateStatus::Error,
            error: Some(error.into()),
            processed_at: Utc::now(),
        }
    }

    /// Ranking key; error rows rank as 0.
    pub fn final_score(&self) -> u8 {
        self.scores.as_ref().map(|s| s.final_score).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub title: String,
    pub skills: SkillSet,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningBatchResult {
    pub batch_id: Uuid,
    pub job: JobSummary,
    /// Sorted by `scores.final` descending; ties keep upload order.
    pub candidates: Vec<CandidateResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_bands() {
        assert_eq!(Decision::from_score(100), Decision::StrongYes);
        assert_eq!(Decision::from_score(85), Decision::StrongYes);
        assert_eq!(Decision::from_score(84), Decision::Yes);
        assert_eq!(Decision::from_score(70), Decision::Yes);
        assert_eq!(Decision::from_score(69), Decision::Maybe);
        assert_eq!(Decision::from_score(55), Decision::Maybe);
        assert_eq!(Decision::from_score(54), Decision::No);
        assert_eq!(Decision::from_score(0), Decision::No);
    }

    #[test]
    fn test_decision_label_parsing() {
        assert_eq!(Decision::from_label("Strong Yes"), Some(Decision::StrongYes));
        assert_eq!(Decision::from_label("strong-yes"), Some(Decision::StrongYes));
        assert_eq!(Decision::from_label(" maybe "), Some(Decision::Maybe));
        assert_eq!(Decision::from_label("definitely"), None);
    }

    #[test]
    fn test_education_boost_values() {
        assert_eq!(EducationLevel::Phd.boost(), 0.10);
        assert_eq!(EducationLevel::Master.boost(), 0.07);
        assert_eq!(EducationLevel::Bachelor.boost(), 0.03);
        assert_eq!(EducationLevel::None.boost(), 0.0);
    }

    #[test]
    fn test_education_label_unknown_is_none() {
        assert_eq!(EducationLevel::from_label("PhD"), Some(EducationLevel::Phd));
        assert_eq!(EducationLevel::from_label("associate"), None);
    }

    #[test]
    fn test_job_title_defaults() {
        assert_eq!(JobDescription::new(None, "x".into()).title, DEFAULT_JOB_TITLE);
        assert_eq!(JobDescription::new(Some("  ".into()), "x".into()).title, DEFAULT_JOB_TITLE);
        assert_eq!(JobDescription::new(Some("SRE".into()), "x".into()).title, "SRE");
    }

    #[test]
    fn test_error_row_omits_scores_and_extraction() {
        let row = CandidateResult::failed("cv.pdf".into(), EMPTY_TEXT_ERROR);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], EMPTY_TEXT_ERROR);
        assert_eq!(json["originalFilename"], "cv.pdf");
        assert!(json.get("scores").is_none());
        assert!(json.get("extraction").is_none());
        assert!(json.get("evaluation").is_none());
        assert_eq!(row.final_score(), 0);
    }

    #[test]
    fn test_score_breakdown_serializes_final_key() {
        let scores = ScoreBreakdown {
            similarity: 0.5,
            experience_fit: 1.0,
            education_boost: 0.03,
            final_score: 58,
        };
        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["final"], 58);
        assert_eq!(json["experienceFit"], 1.0);
        assert_eq!(json["educationBoost"], 0.03);
    }
}
