//! Recruiter rubric for a screened candidate.
//!
//! The LLM drafts the decision, summary and interview questions. A missing,
//! unparsable or invalid answer collapses to the score-band decision with
//! empty lists.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::llm_client::outcome::{generate_json, FallbackReason, LlmOutcome};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::TextGenerator;
use crate::screening::models::{
    CandidateExtraction, Decision, Evaluation, JobDescription, ScoreBreakdown,
};
use crate::screening::prompts::{truncate_chars, EVALUATION_PROMPT};

const MAX_STRENGTHS: usize = 3;
const MAX_GAPS: usize = 3;
const MAX_QUESTIONS: usize = 5;
const MAX_JOB_CHARS: usize = 6_000;

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    decision: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    strengths: Vec<Value>,
    #[serde(default)]
    gaps: Vec<Value>,
    #[serde(default)]
    questions: Vec<Value>,
}

impl RawEvaluation {
    /// `None` when the decision label is missing or not one of the four bands.
    fn into_evaluation(self) -> Option<Evaluation> {
        let decision = Decision::from_label(self.decision.as_deref()?)?;
        Some(Evaluation {
            decision,
            summary: self.summary.map(|s| s.trim().to_string()).unwrap_or_default(),
            strengths: clean_list(&self.strengths, MAX_STRENGTHS),
            gaps: clean_list(&self.gaps, MAX_GAPS),
            questions: clean_list(&self.questions, MAX_QUESTIONS),
        })
    }
}

fn clean_list(values: &[Value], max: usize) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

/// Contact details stay out of the prompt.
fn candidate_profile(extraction: &CandidateExtraction) -> String {
    json!({
        "yearsExperience": extraction.years_experience,
        "educationLevel": extraction.education_level,
        "skills": extraction.skills,
    })
    .to_string()
}

#[derive(Clone)]
pub struct Evaluator {
    llm: Option<Arc<dyn TextGenerator>>,
    enabled: bool,
}

impl Evaluator {
    pub fn new(llm: Option<Arc<dyn TextGenerator>>, enabled: bool) -> Self {
        Self { llm, enabled }
    }

    pub async fn evaluate(
        &self,
        job: &JobDescription,
        extraction: &CandidateExtraction,
        scores: &ScoreBreakdown,
    ) -> Evaluation {
        let llm = if self.enabled { self.llm.as_deref() } else { None };
        let prompt = EVALUATION_PROMPT
            .replace("{job_title}", &job.title)
            .replace("{job_text}", truncate_chars(&job.raw_text, MAX_JOB_CHARS))
            .replace("{candidate_profile}", &candidate_profile(extraction))
            .replace("{final_score}", &scores.final_score.to_string());

        match generate_json::<RawEvaluation>(llm, &prompt, JSON_ONLY_SYSTEM).await {
            LlmOutcome::Parsed(raw) => raw.into_evaluation().unwrap_or_else(|| {
                warn!("Evaluation carried no valid decision, using score band");
                Evaluation::from_score(scores.final_score)
            }),
            LlmOutcome::Fallback(FallbackReason::Disabled) => Evaluation::from_score(scores.final_score),
            LlmOutcome::Fallback(reason) => {
                warn!("Evaluation falling back to score band: {reason}");
                Evaluation::from_score(scores.final_score)
            }
        }
    }
}
