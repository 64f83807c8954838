#![cfg(not(tarpaulin_include))]

use dashboard::{DashboardConfig, app};
use std::env;

/// Main entry point for the dashboard web server
///
/// # Arguments
/// * Optional positional arguments: `[data_path] [bind_addr]`
///
/// # Default Configuration
/// * Reads `./sellers.csv` and listens on `127.0.0.1:3000`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::from_args(env::args().skip(1));
    log::info!(
        "Starting dashboard with data {} on {}",
        config.data_path.display(),
        config.bind_addr
    );

    app::run(config).await
}
