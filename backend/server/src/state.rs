use std::sync::Arc;

use super::{
    config::Config,
    storage::{self, FeedbackStore},
};

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn FeedbackStore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let storage = storage::from_config(&config)?;

        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: Config, storage: Arc<dyn FeedbackStore>) -> Arc<Self> {
        Arc::new(Self { config, storage })
    }
}
