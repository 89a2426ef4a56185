#![cfg(not(tarpaulin_include))]

use env_logger::Env;
use sentiscope::app;
use sentiscope::config::AppConfig;
use std::env;

/// Main entry point for the web application
///
/// Initializes logging and runs the dashboard server.
///
/// # Arguments
/// * `[port] [host]` - Optional; default to 3000 on 127.0.0.1
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_args(env::args().skip(1));
    log::debug!("configuration: {:?}", config);

    app::run(config).await
}
