//! Symptom Risk Service: Binary Entrypoint
//! Boots the Axum HTTP server with the configured assessment profiles and models.

use shuttle_axum::ShuttleAxum;
use symptom_risk_scorer::{create_router, telemetry, AppConfig};
use tracing::info;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables ASSESSMENT_CONFIG_PATH / MODEL_CONFIG_PATH / MODEL_TEST_MODE from .env.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let cfg = AppConfig::from_env()?;
    info!(
        profiles = cfg.profiles.len(),
        models = cfg.models.len(),
        "configuration ready"
    );

    let router = create_router(&cfg);
    Ok(router.into())
}
