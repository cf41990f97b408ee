//! Similarity & Fit Scorer.
//!
//! final = round(100 · clamp(0.65·similarity + 0.25·experienceFit + 0.10·educationBoost, 0, 1))
//!
//! Similarity is the mean, over job skills, of the best cosine match against any
//! candidate skill embedding. When either side has no usable embeddings it
//! falls back to Jaccard overlap of the two skill sets. Every component is
//! rounded to 3 decimals before combination.

use std::sync::OnceLock;

use regex::Regex;

use crate::screening::models::{CandidateExtraction, ScoreBreakdown};
use crate::screening::skills::SkillSet;

const SIMILARITY_WEIGHT: f64 = 0.65;
const EXPERIENCE_WEIGHT: f64 = 0.25;
const EDUCATION_WEIGHT: f64 = 0.10;

/// Used when candidate years are not a finite number.
const UNKNOWN_YEARS_FIT: f64 = 0.7;

pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

// ────────────────────────────────────────────────────────────────────────────
// Skill similarity
// ────────────────────────────────────────────────────────────────────────────

/// A skill set paired with its embeddings (parallel arity, `[]` for missing vectors).
#[derive(Debug, Clone, Copy)]
pub struct SkillVectors<'a> {
    pub skills: &'a SkillSet,
    pub vectors: &'a [Vec<f32>],
}

impl SkillVectors<'_> {
    fn has_embeddings(&self) -> bool {
        self.vectors.iter().any(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMethod {
    Embedding,
    Jaccard,
}

/// Cosine similarity; 0 when either vector has zero norm.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// |A ∩ B| / |A ∪ B|, with an empty union counted as 1.
pub fn jaccard(a: &SkillSet, b: &SkillSet) -> f64 {
    let intersection = a.iter().filter(|s| b.contains(s)).count();
    let union = a.len() + b.len() - intersection;
    round3(intersection as f64 / union.max(1) as f64)
}

/// Mean best-match cosine of each job vector against all candidate vectors.
/// A job skill without a vector contributes 0.
pub fn embedding_similarity(job_vectors: &[Vec<f32>], candidate_vectors: &[Vec<f32>]) -> f64 {
    if job_vectors.is_empty() {
        return 0.0;
    }
    let total: f64 = job_vectors
        .iter()
        .map(|job| {
            candidate_vectors
                .iter()
                .map(|candidate| cosine(job, candidate))
                .fold(0.0_f64, f64::max)
        })
        .sum();
    round3((total / job_vectors.len() as f64).clamp(0.0, 1.0))
}

pub fn skill_similarity(job: SkillVectors<'_>, candidate: SkillVectors<'_>) -> (f64, SimilarityMethod) {
    if job.has_embeddings() && candidate.has_embeddings() {
        (
            embedding_similarity(job.vectors, candidate.vectors),
            SimilarityMethod::Embedding,
        )
    } else {
        (jaccard(job.skills, candidate.skills), SimilarityMethod::Jaccard)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExperienceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

struct RangePatterns {
    between: Regex,
    at_least: Regex,
    plus: Regex,
    bare: Regex,
}

fn range_patterns() -> &'static RangePatterns {
    static PATTERNS: OnceLock<RangePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        const NUM: &str = r"(\d+(?:\.\d+)?)";
        const YEARS: &str = r"\s*(?:years?|yrs?)\b";
        let build = |pattern: String| Regex::new(&pattern).expect("valid experience regex");
        RangePatterns {
            between: build(format!(r"(?i){NUM}\s*(?:-|–|—|to)\s*{NUM}\s*\+?{YEARS}")),
            at_least: build(format!(r"(?i)at\s+least\s+{NUM}\s*\+?{YEARS}")),
            plus: build(format!(r"(?i){NUM}\s*\+{YEARS}")),
            bare: build(format!(r"(?i){NUM}{YEARS}")),
        }
    })
}

fn capture_number(re: &Regex, text: &str, group: usize) -> Option<f64> {
    re.captures(text)
        .and_then(|c| c.get(group))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parses the required experience range from job text.
/// Order: "X-Y years", "at least X years", "X+ years", "X years".
pub fn parse_experience_range(jd_text: &str) -> ExperienceRange {
    let patterns = range_patterns();

    if let Some(caps) = patterns.between.captures(jd_text) {
        let low = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        let high = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
        if let (Some(low), Some(high)) = (low, high) {
            return ExperienceRange {
                min: Some(low.min(high)),
                max: Some(low.max(high)),
            };
        }
    }

    let min = capture_number(&patterns.at_least, jd_text, 1)
        .or_else(|| capture_number(&patterns.plus, jd_text, 1))
        .or_else(|| capture_number(&patterns.bare, jd_text, 1));

    ExperienceRange { min, max: None }
}

/// Experience fit in [0, 1] for `years` against `range`.
pub fn experience_fit(years: f64, range: ExperienceRange) -> f64 {
    if !years.is_finite() {
        return UNKNOWN_YEARS_FIT;
    }
    let y = years.max(0.0);

    let fit = match (range.min, range.max) {
        (None, None) => (y / 6.0).max(0.5).min(1.0),
        (Some(min), Some(max)) => {
            if y < min {
                below_min(y, min)
            } else if y > max {
                above_max(y, max)
            } else {
                1.0
            }
        }
        (Some(min), None) => {
            if y >= min {
                1.0
            } else {
                below_min(y, min)
            }
        }
        (None, Some(max)) => {
            if y <= max {
                1.0
            } else {
                above_max(y, max)
            }
        }
    };
    round3(fit.clamp(0.0, 1.0))
}

fn below_min(y: f64, min: f64) -> f64 {
    if min <= 0.0 {
        return 1.0;
    }
    (1.0 - (min - y) / min).max(0.0)
}

fn above_max(y: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.6;
    }
    (1.0 - (y - max) / max).max(0.6)
}

// ────────────────────────────────────────────────────────────────────────────
// Combination
// ────────────────────────────────────────────────────────────────────────────

/// Rounds each component to 3 decimals and combines them into the 0–100 score.
pub fn combine(similarity: f64, experience_fit: f64, education_boost: f64) -> ScoreBreakdown {
    let similarity = round3(similarity.clamp(0.0, 1.0));
    let experience_fit = round3(experience_fit.clamp(0.0, 1.0));
    let education_boost = round3(education_boost.clamp(0.0, 0.1));

    let weighted = SIMILARITY_WEIGHT * similarity
        + EXPERIENCE_WEIGHT * experience_fit
        + EDUCATION_WEIGHT * education_boost;
    let final_score = (100.0 * weighted.clamp(0.0, 1.0)).round() as u8;

    ScoreBreakdown {
        similarity,
        experience_fit,
        education_boost,
        final_score,
    }
}

/// Full score for one candidate against one job.
pub fn score(
    job: SkillVectors<'_>,
    candidate: SkillVectors<'_>,
    jd_text: &str,
    extraction: &CandidateExtraction,
) -> (ScoreBreakdown, SimilarityMethod) {
    let (similarity, method) = skill_similarity(job, candidate);
    let fit = experience_fit(extraction.years_experience, parse_experience_range(jd_text));
    let boost = extraction.education_level.boost();
    (combine(similarity, fit, boost), method)
}
