mod actions;
mod api_client;
mod classify;
mod commands;
mod config;
mod errors;
mod health;
mod report;
mod share;
mod state;
mod store;
mod view;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::Cli;
use crate::config::Config;
use crate::state::AppContext;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(state_dir) = &cli.state_dir {
        config.state_dir = state_dir.clone();
    }

    // Logs go to stderr; stdout carries results only.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Starting AI Resume Analyzer v{}", env!("CARGO_PKG_VERSION"));

    let ctx = AppContext::build(config, !cli.no_persist)?;
    debug!(api_url = %ctx.api.base_url(), "Backend client initialized");

    Ok(cli.run(ctx).await)
}
