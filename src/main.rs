//! File Drop - Entry Point
//!
//! HTTP file drop: list, upload, download and delete files under one root.

use log::{error, info};
use std::process::ExitCode;

use file_drop::Server;
use file_drop::config::ServerConfig;
use file_drop::error::FileDropError;
use file_drop::utils::logging::setup_logging;

fn main() -> ExitCode {
    setup_logging();

    info!("Launching file drop server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if config.workers > 0 {
        builder.worker_threads(config.workers);
    }
    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), FileDropError> {
    let server = Server::new(config).await?;
    server.start().await
}
