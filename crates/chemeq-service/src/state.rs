//! Application state shared across handlers.

use std::sync::Arc;

use chemeq_core::Pipeline;
use chemeq_store::Store;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// The upload store. Every read and write goes through this lock, so
    /// handlers only ever observe committed uploads.
    pub store: Mutex<Store>,
    /// Configuration loaded at startup.
    pub config: Config,
    /// Ingest pipeline built from `config.ingest`.
    pub pipeline: Pipeline,
    /// When the service started.
    pub started_at: OffsetDateTime,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store, config: Config) -> Arc<Self> {
        let pipeline = Pipeline::new(config.ingest.limits());
        Arc::new(Self {
            store: Mutex::new(store),
            config,
            pipeline,
            started_at: OffsetDateTime::now_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_follows_config() {
        let mut config = Config::default();
        config.ingest.max_rows = 42;
        let state = AppState::new(Store::open_in_memory().unwrap(), config);
        assert_eq!(state.pipeline.limits().max_rows, 42);
    }
}
