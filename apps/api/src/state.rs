use std::sync::Arc;

use crate::config::Config;
use crate::screening::pipeline::Screener;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Built once at startup with the configured LLM and embedding providers.
    pub screener: Arc<Screener>,
}
