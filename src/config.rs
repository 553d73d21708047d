use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::model::seed;

/// Cup-winning probability dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "trophy-odds", version, about)]
pub struct Config {
    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "127.0.0.1:8080")]
    pub dashboard_addr: String,

    /// Season label written into exported reports
    #[arg(long, env = "SEASON", default_value = seed::SEASON)]
    pub season: String,

    /// Write a JSON report and exit instead of serving the dashboard
    #[arg(
        long,
        env = "EXPORT_PATH",
        num_args = 0..=1,
        default_missing_value = seed::DEFAULT_EXPORT_FILE
    )]
    pub export: Option<PathBuf>,

    /// Factor override applied before serving or exporting, e.g. `recent-form=9.1`
    #[arg(long = "factor", value_name = "ID=VALUE", value_parser = parse_factor_override)]
    pub factors: Vec<(String, f64)>,
}

fn parse_factor_override(raw: &str) -> Result<(String, f64), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", raw))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing factor id in '{}'", raw));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for '{}': {}", id, e))?;
    Ok((id.to_string(), value))
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.season.trim().is_empty() {
            anyhow::bail!("season label must not be empty");
        }
        if self.export.is_none() {
            self.listen_addr()?;
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.dashboard_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid dashboard address '{}': {}", self.dashboard_addr, e))
    }
}
