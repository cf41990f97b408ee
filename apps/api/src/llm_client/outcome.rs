//! Structured-output helper: every LLM JSON request ends in either a parsed
//! value or an explicit reason to take the deterministic fallback.

use std::fmt;

use serde::de::DeserializeOwned;

use super::{extract_json_object, TextGenerator};

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// No LLM configured, or the caller turned this call off.
    Disabled,
    Upstream(String),
    EmptyResponse,
    NoJsonObject,
    Schema(String),
    /// Parsed, but carried nothing usable.
    EmptyResult,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Disabled => write!(f, "llm disabled"),
            FallbackReason::Upstream(e) => write!(f, "upstream error: {e}"),
            FallbackReason::EmptyResponse => write!(f, "empty response"),
            FallbackReason::NoJsonObject => write!(f, "no JSON object in response"),
            FallbackReason::Schema(e) => write!(f, "schema mismatch: {e}"),
            FallbackReason::EmptyResult => write!(f, "empty result"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutcome<T> {
    Parsed(T),
    Fallback(FallbackReason),
}

impl<T> LlmOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            LlmOutcome::Parsed(value) => Some(value),
            LlmOutcome::Fallback(_) => None,
        }
    }

    /// Keeps a parsed value only if `accept` holds; otherwise `EmptyResult`.
    pub fn require(self, accept: impl FnOnce(&T) -> bool) -> Self {
        match self {
            LlmOutcome::Parsed(value) if accept(&value) => LlmOutcome::Parsed(value),
            LlmOutcome::Parsed(_) => LlmOutcome::Fallback(FallbackReason::EmptyResult),
            fallback => fallback,
        }
    }
}

/// Parses raw model text: locate the first balanced `{...}` block and deserialize it.
pub fn parse_json_text<T: DeserializeOwned>(text: &str) -> LlmOutcome<T> {
    if text.trim().is_empty() {
        return LlmOutcome::Fallback(FallbackReason::EmptyResponse);
    }
    let Some(json) = extract_json_object(text) else {
        return LlmOutcome::Fallback(FallbackReason::NoJsonObject);
    };
    match serde_json::from_str::<T>(json) {
        Ok(value) => LlmOutcome::Parsed(value),
        Err(e) => LlmOutcome::Fallback(FallbackReason::Schema(e.to_string())),
    }
}

/// Sends a JSON-extraction prompt. Never errors: upstream failures and
/// malformed output both come back as `Fallback`.
pub async fn generate_json<T: DeserializeOwned>(
    llm: Option<&dyn TextGenerator>,
    prompt: &str,
    system: &str,
) -> LlmOutcome<T> {
    let Some(llm) = llm else {
        return LlmOutcome::Fallback(FallbackReason::Disabled);
    };
    match llm.generate_text(prompt, system).await {
        Ok(text) => parse_json_text(&text),
        Err(e) => LlmOutcome::Fallback(FallbackReason::Upstream(e.to_string())),
    }
}
