use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::config::ServiceConfig;
use crate::data::loader::load_store;
use crate::data::model::DatasetStore;
use crate::data::stats::TrendConfig;
use crate::predict::{ForestPredictor, Predictor};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything a request handler reads. Loaded once, never mutated.
#[derive(Clone)]
pub struct AppState {
    /// Cutoff and historical tables.
    pub store: Arc<DatasetStore>,

    /// Trained classifier behind the prediction endpoint.
    pub predictor: Arc<dyn Predictor>,

    /// Synthetic year assignment for branch trends.
    pub trend: TrendConfig,
}

impl AppState {
    pub fn new(store: DatasetStore, predictor: Arc<dyn Predictor>, trend: TrendConfig) -> Self {
        Self {
            store: Arc::new(store),
            predictor,
            trend,
        }
    }

    /// Load both tables and the model named by `config`. Any failure here
    /// should stop the process before it serves traffic.
    pub fn load(config: &ServiceConfig) -> Result<Self> {
        let store = load_store(&config.cutoff_path, &config.historical_path)?;
        info!(
            "loaded {} cutoff rows and {} historical rows",
            store.cutoffs.len(),
            store.history.len()
        );

        let predictor = ForestPredictor::load(&config.model_path)
            .with_context(|| format!("loading model {}", config.model_path.display()))?;

        Ok(Self::new(store, Arc::new(predictor), config.trend.clone()))
    }
}
