//! Entity/Skill Extractor.
//!
//! The LLM is asked for structured JSON first. Whatever it leaves empty (or
//! everything, when it is disabled or answers with something unparsable) is
//! filled from deterministic regex and lexicon extraction.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm_client::outcome::{generate_json, LlmOutcome};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::TextGenerator;
use crate::screening::models::{CandidateExtraction, EducationLevel};
use crate::screening::prompts::{
    truncate_chars, ENTITY_EXTRACTION_PROMPT, SKILL_EXTRACTION_PROMPT,
};
use crate::screening::skills::{lexicon_skills, SkillSet, MAX_SKILLS};

/// Text beyond this many characters is not sent to the LLM.
const MAX_PROMPT_CHARS: usize = 12_000;

/// Years-of-experience mentions above this are treated as noise.
const MAX_PLAUSIBLE_YEARS: f64 = 60.0;

// ────────────────────────────────────────────────────────────────────────────
// LLM response shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntities {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default, alias = "years_experience")]
    years_experience: Option<Value>,
    #[serde(default, alias = "education_level")]
    education_level: Option<String>,
    #[serde(default)]
    skills: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawSkills {
    #[serde(default)]
    skills: Vec<Value>,
}

/// Entities as the LLM reported them; `None` means "not provided".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmEntities {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_experience: Option<f64>,
    pub education_level: Option<EducationLevel>,
    pub skills: SkillSet,
}

impl From<RawEntities> for LlmEntities {
    fn from(raw: RawEntities) -> Self {
        Self {
            name: non_empty(raw.name),
            email: non_empty(raw.email),
            phone: non_empty(raw.phone),
            years_experience: raw.years_experience.as_ref().and_then(lenient_number),
            education_level: raw
                .education_level
                .as_deref()
                .and_then(EducationLevel::from_label),
            skills: string_values(&raw.skills).collect::<SkillSet>().capped(MAX_SKILLS),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

/// Accepts `5`, `5.5`, `"5"`, `"5+ years"`. Anything else is "not provided".
fn lenient_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => leading_number(s)?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}

fn leading_number(s: &str) -> Option<f64> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER
        .get_or_init(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("valid number regex"))
        .captures(s)
        .and_then(|c| c[1].parse().ok())
}

fn string_values(values: &[Value]) -> impl Iterator<Item = &str> {
    values.iter().filter_map(Value::as_str)
}

// ────────────────────────────────────────────────────────────────────────────
// Regex fallback
// ────────────────────────────────────────────────────────────────────────────

struct FallbackPatterns {
    email: Regex,
    phone: Regex,
    year_range: Regex,
    years: Regex,
    phd: Regex,
    master: Regex,
    bachelor: Regex,
}

fn patterns() -> &'static FallbackPatterns {
    static PATTERNS: OnceLock<FallbackPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build = |p: &str| Regex::new(p).expect("valid fallback regex");
        FallbackPatterns {
            email: build(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}"),
            phone: build(r"\+?\d[\d \t().\-]{6,}\d"),
            year_range: build(r"\b(?:19|20)\d{2}\s*[-–]\s*(?:19|20)\d{2}\b"),
            years: build(r"(?i)(\d+(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\b"),
            phd: build(r"(?i)\b(?:ph\.?\s?d|doctorate|doctoral)\b"),
            master: build(r"(?i)\b(?:masters?|master's|m\.?sc|mba|m\.?tech)\b|\bm\.s\."),
            bachelor: build(
                r"(?i)\b(?:bachelors?|bachelor's|b\.?sc|b\.?tech|undergraduate)\b|\b(?:b\.e|b\.a|b\.s)\.",
            ),
        }
    })
}

pub fn fallback_email(text: &str) -> Option<String> {
    patterns().email.find(text).map(|m| m.as_str().to_string())
}

/// First digit run with separators holding at least 8 digits.
/// "YYYY - YYYY" date ranges split a run, so a range next to a number is never part of it.
pub fn fallback_phone(text: &str) -> Option<String> {
    let p = patterns();
    p.phone
        .find_iter(text)
        .flat_map(|m| p.year_range.split(m.as_str()))
        .map(|s| s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '.')))
        .find(|s| s.chars().filter(char::is_ascii_digit).count() >= 8)
        .map(str::to_string)
}

/// Largest "<N> years" / "<N>+ years" mention.
pub fn fallback_years(text: &str) -> Option<f64> {
    patterns()
        .years
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .filter(|y| *y <= MAX_PLAUSIBLE_YEARS)
        .fold(None, |best: Option<f64>, y| Some(best.map_or(y, |b| b.max(y))))
}

/// Highest degree mentioned, precedence phd > master > bachelor.
pub fn fallback_education(text: &str) -> EducationLevel {
    let p = patterns();
    if p.phd.is_match(text) {
        EducationLevel::Phd
    } else if p.master.is_match(text) {
        EducationLevel::Master
    } else if p.bachelor.is_match(text) {
        EducationLevel::Bachelor
    } else {
        EducationLevel::None
    }
}

/// First short line near the top that reads like a personal name.
pub fn fallback_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(5)
        .find(|line| looks_like_name(line))
        .map(str::to_string)
}

fn looks_like_name(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) || line.len() > 50 {
        return false;
    }
    let lowered = line.to_lowercase();
    if lowered.contains("resume") || lowered.contains("curriculum") {
        return false;
    }
    words.iter().all(|w| {
        w.chars().next().is_some_and(char::is_uppercase)
            && w.chars().all(|c| c.is_alphabetic() || matches!(c, '.' | '-' | '\''))
    })
}

/// Merges LLM entities with regex fallbacks, field by field.
pub fn resolve_extraction(
    llm: Option<LlmEntities>,
    extra_skills: SkillSet,
    text: &str,
) -> CandidateExtraction {
    let llm = llm.unwrap_or_default();
    CandidateExtraction {
        name: llm.name.or_else(|| fallback_name(text)),
        email: llm.email.or_else(|| fallback_email(text)),
        phone: llm.phone.or_else(|| fallback_phone(text)),
        years_experience: llm
            .years_experience
            .or_else(|| fallback_years(text))
            .unwrap_or(0.0),
        education_level: llm
            .education_level
            .unwrap_or_else(|| fallback_education(text)),
        skills: llm.skills.union(&extra_skills).capped(MAX_SKILLS),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extractor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct EntityExtractor {
    llm: Option<Arc<dyn TextGenerator>>,
}

impl EntityExtractor {
    pub fn new(llm: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { llm }
    }

    /// LLM structured extraction. `Fallback` means the caller must use regex values.
    pub async fn extract_entities(&self, text: &str) -> LlmOutcome<LlmEntities> {
        let prompt = ENTITY_EXTRACTION_PROMPT
            .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
            .replace("{resume_text}", truncate_chars(text, MAX_PROMPT_CHARS));

        match generate_json::<RawEntities>(self.llm.as_deref(), &prompt, JSON_ONLY_SYSTEM).await {
            LlmOutcome::Parsed(raw) => LlmOutcome::Parsed(LlmEntities::from(raw)),
            LlmOutcome::Fallback(reason) => {
                warn!("Entity extraction falling back to regex: {reason}");
                LlmOutcome::Fallback(reason)
            }
        }
    }

    /// Skill set for a job description or profile: LLM first, ontology lexicon otherwise.
    /// At most 40 normalized, deduplicated entries.
    pub async fn extract_skills(&self, text: &str) -> SkillSet {
        let prompt = SKILL_EXTRACTION_PROMPT
            .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
            .replace("{text}", truncate_chars(text, MAX_PROMPT_CHARS));

        let outcome = generate_json::<RawSkills>(self.llm.as_deref(), &prompt, JSON_ONLY_SYSTEM)
            .await
            .require(|raw| string_values(&raw.skills).any(|s| !s.trim().is_empty()));

        match outcome {
            LlmOutcome::Parsed(raw) => {
                let skills = string_values(&raw.skills)
                    .collect::<SkillSet>()
                    .capped(MAX_SKILLS);
                debug!("LLM extracted {} skills", skills.len());
                skills
            }
            LlmOutcome::Fallback(reason) => {
                warn!("Skill extraction falling back to lexicon: {reason}");
                lexicon_skills(text)
            }
        }
    }

    /// Full candidate extraction: LLM entities and skills in parallel, merged
    /// with regex fallbacks for anything missing.
    pub async fn extract_candidate(&self, text: &str) -> CandidateExtraction {
        let (entities, skills) = tokio::join!(self.extract_entities(text), self.extract_skills(text));
        resolve_extraction(entities.ok(), skills, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::FakeLlm;
    use crate::llm_client::LlmError;

    const RESUME: &str = "Jane Q Doe\n\
        jane.doe@example.com | +1 (555) 123-4567\n\
        Frontend engineer with 5 years experience building React and TypeScript apps.\n\
        Worked 2018 - 2023 at Acme; earlier 2 years at a startup.\n\
        Tooling: Jest, Git, Docker. B.Sc. in Computer Science.";

    #[test]
    fn test_fallback_email_and_phone() {
        assert_eq!(fallback_email(RESUME).as_deref(), Some("jane.doe@example.com"));
        assert_eq!(fallback_phone(RESUME).as_deref(), Some("+1 (555) 123-4567"));
    }

    #[test]
    fn test_fallback_phone_skips_short_numbers_and_year_ranges() {
        assert_eq!(fallback_phone("Room 12-34, worked 2018 - 2023"), None);
        assert_eq!(
            fallback_phone("call 2018 - 2023 or 98765 43210").as_deref(),
            Some("98765 43210")
        );
    }

    #[test]
    fn test_fallback_phone_separates_adjacent_year_range() {
        assert_eq!(
            fallback_phone("Acme 2019-2021 555-123-4567").as_deref(),
            Some("555-123-4567")
        );
        assert_eq!(
            fallback_phone("+44 20 7946 0958 2015 - 2020").as_deref(),
            Some("+44 20 7946 0958")
        );
        assert_eq!(fallback_phone("Acme 2019-2021 and 2021-2024"), None);
    }

    #[test]
    fn test_fallback_years_takes_maximum() {
        assert_eq!(fallback_years(RESUME), Some(5.0));
        assert_eq!(fallback_years("3+ years Java, 7 yrs overall"), Some(7.0));
        assert_eq!(fallback_years("fresh graduate"), None);
    }

    #[test]
    fn test_fallback_education_precedence() {
        assert_eq!(fallback_education(RESUME), EducationLevel::Bachelor);
        assert_eq!(
            fallback_education("Bachelor of Arts, Master of Science"),
            EducationLevel::Master
        );
        assert_eq!(
            fallback_education("MSc, then a PhD in Physics"),
            EducationLevel::Phd
        );
        assert_eq!(fallback_education("Self-taught developer"), EducationLevel::None);
        assert_eq!(
            fallback_education("Mastered React hooks"),
            EducationLevel::None
        );
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(fallback_name(RESUME).as_deref(), Some("Jane Q Doe"));
        assert_eq!(fallback_name("RESUME\nSummary: builder of things"), None);
    }

    #[test]
    fn test_lenient_number() {
        assert_eq!(lenient_number(&serde_json::json!(4)), Some(4.0));
        assert_eq!(lenient_number(&serde_json::json!("6+ years")), Some(6.0));
        assert_eq!(lenient_number(&serde_json::json!("several")), None);
        assert_eq!(lenient_number(&serde_json::json!(-2)), None);
        assert_eq!(lenient_number(&serde_json::json!(null)), None);
    }

    #[test]
    fn test_resolve_without_llm_uses_regex_everywhere() {
        let extraction = resolve_extraction(None, lexicon_skills(RESUME), RESUME);
        assert_eq!(extraction.name.as_deref(), Some("Jane Q Doe"));
        assert_eq!(extraction.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(extraction.years_experience, 5.0);
        assert_eq!(extraction.education_level, EducationLevel::Bachelor);
        for skill in ["react", "typescript", "jest", "git", "docker"] {
            assert!(extraction.skills.contains(skill), "missing {skill}");
        }
    }

    #[test]
    fn test_resolve_prefers_llm_fields_and_fills_gaps() {
        let llm = LlmEntities {
            name: Some("J. Doe".into()),
            email: None,
            phone: None,
            years_experience: Some(6.0),
            education_level: None,
            skills: ["Redux"].into_iter().collect(),
        };
        let extraction = resolve_extraction(Some(llm), ["react"].into_iter().collect(), RESUME);
        assert_eq!(extraction.name.as_deref(), Some("J. Doe"));
        assert_eq!(extraction.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(extraction.years_experience, 6.0);
        assert_eq!(extraction.education_level, EducationLevel::Bachelor);
        assert_eq!(extraction.skills.as_slice(), ["redux", "react"]);
    }

    #[test]
    fn test_resolve_defaults_years_to_zero() {
        let extraction = resolve_extraction(None, SkillSet::new(), "Nothing useful here");
        assert_eq!(extraction.years_experience, 0.0);
        assert_eq!(extraction.education_level, EducationLevel::None);
    }

    #[tokio::test]
    async fn test_extract_entities_parses_llm_json_with_prose() {
        let llm = FakeLlm::new(|_| {
            Ok(r#"Sure. {"name": "Jane Doe", "email": null, "phone": "", "yearsExperience": "5",
                "educationLevel": "Masters", "skills": ["JS", "mongo", 7, "Node"]} Thanks!"#
                .to_string())
        });
        let extractor = EntityExtractor::new(Some(llm));
        let entities = extractor.extract_entities(RESUME).await.ok().unwrap();

        assert_eq!(entities.name.as_deref(), Some("Jane Doe"));
        assert_eq!(entities.email, None);
        assert_eq!(entities.phone, None);
        assert_eq!(entities.years_experience, Some(5.0));
        assert_eq!(entities.education_level, Some(EducationLevel::Master));
        assert_eq!(entities.skills.as_slice(), ["javascript", "mongodb", "node.js"]);
    }

    #[tokio::test]
    async fn test_unknown_education_label_falls_through_to_regex() {
        let llm = FakeLlm::new(|_| Ok(r#"{"educationLevel": "diploma"}"#.to_string()));
        let extractor = EntityExtractor::new(Some(llm));
        let entities = extractor.extract_entities("no degree mentioned").await.ok().unwrap();
        assert_eq!(entities.education_level, None);
        let extraction = resolve_extraction(Some(entities), SkillSet::new(), "no degree mentioned");
        assert_eq!(extraction.education_level, EducationLevel::None);
    }

    #[tokio::test]
    async fn test_extract_skills_uses_llm_then_caps() {
        let llm = FakeLlm::new(|_| {
            let skills: Vec<String> = (0..60).map(|i| format!("\"skill {i}\"")).collect();
            Ok(format!("{{\"skills\": [{}]}}", skills.join(",")))
        });
        let extractor = EntityExtractor::new(Some(llm));
        let skills = extractor.extract_skills("anything").await;
        assert_eq!(skills.len(), MAX_SKILLS);
        assert_eq!(skills.as_slice()[0], "skill 0");
    }

    #[tokio::test]
    async fn test_extract_skills_falls_back_on_garbage() {
        let llm = FakeLlm::new(|_| Ok("I'd rather not.".to_string()));
        let extractor = EntityExtractor::new(Some(llm.clone()));
        let skills = extractor.extract_skills("We use React, Node and MongoDB.").await;
        assert_eq!(skills.as_slice(), ["react", "node.js", "mongodb"]);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_extract_skills_falls_back_on_empty_list_and_upstream_error() {
        let empty = EntityExtractor::new(Some(FakeLlm::new(|_| Ok(r#"{"skills": []}"#.into()))));
        assert_eq!(empty.extract_skills("Payroll and onboarding").await.as_slice(), ["payroll", "onboarding"]);

        let failing = EntityExtractor::new(Some(FakeLlm::new(|_| {
            Err(LlmError::Api {
                status: 400,
                message: "bad request".into(),
            })
        })));
        assert_eq!(failing.extract_skills("Docker and AWS").await.as_slice(), ["docker", "aws"]);
    }

    #[tokio::test]
    async fn test_extract_candidate_without_llm() {
        let extractor = EntityExtractor::new(None);
        let extraction = extractor.extract_candidate(RESUME).await;
        assert_eq!(extraction.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(extraction.years_experience, 5.0);
        assert!(extraction.skills.contains("react"));
    }
}
