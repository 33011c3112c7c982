mod config;
mod data_aquisition;
mod gui;
mod network;
mod topology;

use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use config::{Args, DashboardConfig};
use gui::app;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,meshsim_dashboard=info")),
        )
        .init();

    let args = Args::parse();
    let config = match DashboardConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => Arc::new(rt),
        Err(e) => {
            error!(error = %e, "Failed to start the async runtime");
            std::process::exit(1);
        }
    };
    app::main(rt, config);
}
