//! Screening Orchestrator.
//!
//! Job skills are extracted and embedded once per batch. Each resume then runs
//! on its own task: text → entities/skills → embeddings → score → rubric.
//! Workers are bounded by a semaphore and a per-resume wall-clock timeout.
//! Any failure, including a panicking worker, turns into an `error` row for
//! that file only.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::llm_client::TextGenerator;
use crate::screening::embeddings::EmbeddingClient;
use crate::screening::entities::EntityExtractor;
use crate::screening::evaluation::Evaluator;
use crate::screening::models::{
    CandidateResult, JobDescription, JobSummary, ResumeFile, ScreeningBatchResult,
    EMPTY_TEXT_ERROR,
};
use crate::screening::scoring::{score, SkillVectors};
use crate::screening::skills::SkillSet;
use crate::screening::text_extract::{extract_text, ExtractError};

/// Error recorded when a worker dies without reporting a result.
pub const WORKER_FAILED_ERROR: &str = "worker_failed";

#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    /// Extracted text shorter than this many characters is rejected.
    pub min_text_chars: usize,
    pub explanations_enabled: bool,
    pub concurrency: usize,
    pub resume_timeout: Duration,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 200,
            explanations_enabled: true,
            concurrency: 4,
            resume_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("{}", EMPTY_TEXT_ERROR)]
    EmptyText,

    #[error("timeout: resume not screened within {0:?}")]
    Timeout(Duration),

    #[error("worker_failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy)]
enum ResumeStage {
    TextExtracted,
    EntitiesExtracted,
    SkillsEmbedded,
    Scored,
    Evaluated,
}

impl fmt::Display for ResumeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResumeStage::TextExtracted => "text_extracted",
            ResumeStage::EntitiesExtracted => "entities_extracted",
            ResumeStage::SkillsEmbedded => "skills_embedded",
            ResumeStage::Scored => "scored",
            ResumeStage::Evaluated => "evaluated",
        };
        f.write_str(name)
    }
}

/// Read-only state shared by every worker of one batch.
struct BatchContext {
    job: JobDescription,
    job_skills: SkillSet,
    job_vectors: Vec<Vec<f32>>,
}

#[derive(Clone)]
pub struct Screener {
    extractor: EntityExtractor,
    embedder: EmbeddingClient,
    evaluator: Evaluator,
    config: ScreeningConfig,
}

impl Screener {
    pub fn new(
        llm: Option<Arc<dyn TextGenerator>>,
        embedder: EmbeddingClient,
        config: ScreeningConfig,
    ) -> Self {
        Self {
            extractor: EntityExtractor::new(llm.clone()),
            evaluator: Evaluator::new(llm, config.explanations_enabled),
            embedder,
            config,
        }
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    /// Screens every file against `job`. Always returns one row per file,
    /// sorted by final score descending with ties in upload order.
    /// Dropping the returned future aborts all in-flight workers.
    pub async fn screen_batch(
        &self,
        job: JobDescription,
        files: Vec<ResumeFile>,
    ) -> ScreeningBatchResult {
        let batch_id = Uuid::new_v4();
        let created_at = Utc::now();
        info!(%batch_id, files = files.len(), title = %job.title, "Screening batch started");

        let job_skills = self.extractor.extract_skills(&job.raw_text).await;
        let job_vectors = self.embedder.embed(job_skills.as_slice()).await;
        debug!(
            %batch_id,
            skills = job_skills.len(),
            embeddings = self.embedder.is_enabled(),
            "Job skills prepared"
        );

        let context = Arc::new(BatchContext {
            job,
            job_skills,
            job_vectors,
        });
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let mut results: Vec<CandidateResult> = files
            .iter()
            .map(|f| CandidateResult::failed(f.original_filename.clone(), WORKER_FAILED_ERROR))
            .collect();

        let mut workers = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let screener = self.clone();
            let context = Arc::clone(&context);
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, screener.screen_with_timeout(&context, file).await)
            });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, row)) => results[index] = row,
                Err(e) => error!(%batch_id, "Screening worker died: {e}"),
            }
        }

        results.sort_by(|a, b| b.final_score().cmp(&a.final_score()));

        let screened = results.iter().filter(|r| r.scores.is_some()).count();
        info!(
            %batch_id,
            screened,
            failed = results.len() - screened,
            "Screening batch finished"
        );

        ScreeningBatchResult {
            batch_id,
            job: JobSummary {
                title: context.job.title.clone(),
                skills: context.job_skills.clone(),
                created_at,
            },
            candidates: results,
        }
    }

    async fn screen_with_timeout(&self, context: &BatchContext, file: ResumeFile) -> CandidateResult {
        let filename = file.original_filename.clone();
        let outcome = tokio::time::timeout(self.config.resume_timeout, self.screen_resume(context, file))
            .await
            .unwrap_or(Err(ResumeError::Timeout(self.config.resume_timeout)));

        match outcome {
            Ok(row) => row,
            Err(e) => {
                warn!(file = %filename, "Resume not screened: {e}");
                CandidateResult::failed(filename, e.to_string())
            }
        }
    }

    async fn screen_resume(
        &self,
        context: &BatchContext,
        file: ResumeFile,
    ) -> Result<CandidateResult, ResumeError> {
        let filename = file.original_filename.clone();

        let text = tokio::task::spawn_blocking(move || extract_text(&file))
            .await
            .map_err(|e| ResumeError::Worker(e.to_string()))??;
        let chars = text.chars().count();
        if chars < self.config.min_text_chars {
            return Err(ResumeError::EmptyText);
        }
        debug!(file = %filename, stage = %ResumeStage::TextExtracted, chars);

        let extraction = self.extractor.extract_candidate(&text).await;
        debug!(file = %filename, stage = %ResumeStage::EntitiesExtracted, skills = extraction.skills.len());

        let candidate_vectors = self.embedder.embed(extraction.skills.as_slice()).await;
        debug!(file = %filename, stage = %ResumeStage::SkillsEmbedded);

        let (scores, method) = score(
            SkillVectors {
                skills: &context.job_skills,
                vectors: &context.job_vectors,
            },
            SkillVectors {
                skills: &extraction.skills,
                vectors: &candidate_vectors,
            },
            &context.job.raw_text,
            &extraction,
        );
        debug!(file = %filename, stage = %ResumeStage::Scored, final_score = scores.final_score, ?method);

        let evaluation = self.evaluator.evaluate(&context.job, &extraction, &scores).await;
        debug!(file = %filename, stage = %ResumeStage::Evaluated, decision = ?evaluation.decision);

        Ok(CandidateResult::screened(filename, extraction, scores, evaluation))
    }
}
