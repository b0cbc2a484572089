use crate::config::AppConfig;
use crate::services::completion::CompletionClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub completion: CompletionClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let completion = CompletionClient::new(&config.upstream)?;
        Ok(Self {
            config: Arc::new(config),
            completion,
        })
    }
}
