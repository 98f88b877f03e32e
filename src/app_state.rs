use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::analyzer::ImageAnalyzer;
use crate::services::processor::ImageProcessor;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub processor: Arc<ImageProcessor>,
}

impl AppState {
    pub fn new(db: SqlitePool, processor: ImageProcessor) -> Self {
        Self {
            db,
            processor: Arc::new(processor),
        }
    }

    /// Build state with a processor configured from `config`.
    pub fn from_config(db: SqlitePool, analyzer: Arc<dyn ImageAnalyzer>, config: &AppConfig) -> Self {
        let processor = ImageProcessor::from_config(db.clone(), analyzer, config);
        Self::new(db, processor)
    }
}
