//! Skill normalization, the fixed skill ontology and the lexicon-based fallback extractor.
//!
//! Every skill that enters a `SkillSet` is lowercased, whitespace-collapsed,
//! stripped of surrounding punctuation and mapped through the synonym table.
//! `normalize_skill` is idempotent.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum skills kept per extracted set.
pub const MAX_SKILLS: usize = 40;

/// Longest multi-word ontology term, in tokens.
const MAX_NGRAM: usize = 3;

/// Alias → canonical name. Canonical names must not appear as aliases.
const SYNONYMS: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("es6", "javascript"),
    ("ts", "typescript"),
    ("reactjs", "react"),
    ("react.js", "react"),
    ("node", "node.js"),
    ("nodejs", "node.js"),
    ("node js", "node.js"),
    ("expressjs", "express"),
    ("express.js", "express"),
    ("mongo", "mongodb"),
    ("postgres", "postgresql"),
    ("mui", "material ui"),
    ("material-ui", "material ui"),
    ("sklearn", "scikit-learn"),
    ("scikit learn", "scikit-learn"),
    ("tf", "tensorflow"),
    ("k8s", "kubernetes"),
    ("ml", "machine learning"),
    ("amazon web services", "aws"),
    ("html5", "html"),
    ("css3", "css"),
    ("rest", "rest api"),
    ("restful", "rest api"),
    ("restful api", "rest api"),
    ("rest apis", "rest api"),
    ("problem-solving", "problem solving"),
    ("team work", "teamwork"),
    ("team player", "teamwork"),
    ("recruiting", "recruitment"),
    ("hr information systems", "hris"),
];

/// Domain ontology used by the lexicon fallback: soft skills, tech stack, HR vocabulary.
const ONTOLOGY: &[&str] = &[
    // soft skills
    "communication",
    "leadership",
    "teamwork",
    "problem solving",
    "time management",
    "negotiation",
    "conflict resolution",
    "stakeholder management",
    // tech stack
    "javascript",
    "typescript",
    "react",
    "node.js",
    "express",
    "mongodb",
    "postgresql",
    "sql",
    "python",
    "java",
    "html",
    "css",
    "aws",
    "docker",
    "kubernetes",
    "git",
    "material ui",
    "redux",
    "graphql",
    "rest api",
    "jest",
    "tensorflow",
    "scikit-learn",
    "machine learning",
    // HR
    "recruitment",
    "onboarding",
    "payroll",
    "performance management",
    "employee relations",
    "talent acquisition",
    "hris",
    "compliance",
    "training",
    "benefits administration",
];

/// Lowercases, collapses whitespace, trims surrounding punctuation and applies synonyms.
pub fn normalize_skill(raw: &str) -> String {
    let collapsed = raw
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let trimmed = collapsed.trim_matches(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'));

    SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == trimmed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

pub fn in_ontology(skill: &str) -> bool {
    ONTOLOGY.contains(&skill)
}

/// Ordered, deduplicated list of normalized skills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SkillSet(Vec<String>);

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes and inserts a skill. Returns false for empty or duplicate entries.
    pub fn insert(&mut self, raw: &str) -> bool {
        let skill = normalize_skill(raw);
        if skill.is_empty() || self.0.contains(&skill) {
            return false;
        }
        self.0.push(skill);
        true
    }

    pub fn capped(mut self, max: usize) -> Self {
        self.0.truncate(max);
        self
    }

    /// Union preserving `self` order first, then unseen entries of `other`.
    pub fn union(&self, other: &SkillSet) -> SkillSet {
        let mut merged = self.clone();
        for skill in other.iter() {
            merged.insert(skill);
        }
        merged
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.0.iter().any(|s| s == skill)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SkillSet::new();
        for raw in iter {
            set.insert(raw.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for SkillSet {
    fn from(raw: Vec<String>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<SkillSet> for Vec<String> {
    fn from(set: SkillSet) -> Self {
        set.0
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"[a-z0-9][a-z0-9+#.\-]*").expect("valid token regex"))
}

/// Deterministic skill extraction: n-grams of word-ish tokens, normalized,
/// kept only when they name an ontology term. First occurrence wins.
pub fn lexicon_skills(text: &str) -> SkillSet {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().trim_end_matches(['.', '-']))
        .filter(|t| !t.is_empty())
        .collect();

    let mut skills = SkillSet::new();
    for start in 0..tokens.len() {
        for len in 1..=MAX_NGRAM.min(tokens.len() - start) {
            let candidate = normalize_skill(&tokens[start..start + len].join(" "));
            if in_ontology(&candidate) {
                skills.insert(&candidate);
            }
        }
        if skills.len() >= MAX_SKILLS {
            break;
        }
    }
    skills.capped(MAX_SKILLS)
}
