// Resume screening: text extraction, entity/skill extraction, embeddings,
// fit scoring and the batch orchestrator.
// All LLM calls go through llm_client; no direct provider calls here.

pub mod embeddings;
pub mod entities;
pub mod evaluation;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod scoring;
pub mod skills;
pub mod text_extract;
