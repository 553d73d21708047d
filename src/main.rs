use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use trophy_odds::config::Config;
use trophy_odds::dashboard::{self, AppState};
use trophy_odds::PredictionModel;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let mut model = PredictionModel::seeded(&config.season);
    if !config.factors.is_empty() {
        for (id, value) in &config.factors {
            model
                .set_factor_value(id, *value)
                .with_context(|| format!("Invalid --factor override '{}'", id))?;
        }
        model.recompute();
        info!("Applied {} factor override(s)", config.factors.len());
    }

    if let Some(path) = &config.export {
        let json = model
            .export_snapshot()
            .to_json_pretty()
            .context("Failed to serialise report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
        return Ok(());
    }

    let addr = config.listen_addr()?;
    let app = dashboard::router(AppState::new(model));
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
