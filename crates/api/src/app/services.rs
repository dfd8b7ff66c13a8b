use std::sync::Arc;

use tracing::info;

use stockpilot_ai::PredictionProvider;
use stockpilot_infra::config::AppConfig;
use stockpilot_infra::external::build_predictor;
use stockpilot_infra::optimization::OptimizationService;
use stockpilot_infra::read_model::{
    InMemorySellerStore, PostgresSellerStore, SellerDataStore, StoreError,
};

/// Shared, request-independent services handed to every handler.
pub struct AppServices {
    pub optimization: OptimizationService,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn SellerDataStore>,
        predictor: Arc<dyn PredictionProvider>,
        max_concurrent_predictions: usize,
    ) -> Self {
        Self {
            optimization: OptimizationService::new(store, predictor)
                .with_max_concurrency(max_concurrent_predictions),
        }
    }
}

/// Wire the seller data store and predictor from configuration.
///
/// `DATABASE_URL` selects Postgres; otherwise an in-memory store is used,
/// optionally seeded from `SEED_FILE`.
pub async fn build_services(cfg: &AppConfig) -> Result<AppServices, StoreError> {
    let store: Arc<dyn SellerDataStore> = match (&cfg.database_url, &cfg.seed_file) {
        (Some(url), _) => {
            info!("using postgres seller data store");
            Arc::new(PostgresSellerStore::connect(url).await?)
        }
        (None, Some(path)) => {
            info!(seed = %path.display(), "using seeded in-memory seller data store");
            Arc::new(InMemorySellerStore::from_json_file(path)?)
        }
        (None, None) => {
            info!("using empty in-memory seller data store");
            Arc::new(InMemorySellerStore::new())
        }
    };

    let predictor = build_predictor(&cfg.predictor);

    Ok(AppServices::new(
        store,
        predictor,
        cfg.predictor.max_concurrent_predictions,
    ))
}
