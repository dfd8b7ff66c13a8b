use std::sync::Arc;

use anyhow::Context;

use stockpilot_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside local development.
    let _ = dotenvy::dotenv();
    stockpilot_observability::init();

    let cfg = AppConfig::from_env().context("invalid configuration")?;

    let services = stockpilot_api::app::build_services(&cfg)
        .await
        .context("failed to initialize seller data store")?;

    let app = stockpilot_api::app::build_app(cfg.jwt_secret.clone(), Arc::new(services));

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
