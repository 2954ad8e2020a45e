use crate::config::ForecastConfig;
use std::sync::Arc;

/// Shared, read-only handler state. Models never live here; each request fits its own.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ForecastConfig>,
}

impl AppState {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
