use std::sync::Arc;

use crate::core::config::{AppPaths, EngineConfig};
use crate::core::errors::ApiError;
use crate::corpus::SqliteCorpusStore;
use crate::engine::Engine;
use crate::llm::OpenAiProvider;

/// Application state shared across all routes.
///
/// Every component is constructed once here and passed down explicitly;
/// there are no global connection singletons.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: EngineConfig,
    pub engine: Arc<Engine>,
}

impl AppState {
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let config = EngineConfig::load(&paths);

        let store = Arc::new(SqliteCorpusStore::new(&paths).await?);
        let provider = Arc::new(OpenAiProvider::from_config(&config.generation)?);
        let engine = Arc::new(Engine::new(store, provider, config.clone())?);

        Ok(Arc::new(Self {
            paths,
            config,
            engine,
        }))
    }
}
