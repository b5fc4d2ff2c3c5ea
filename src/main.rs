mod ai;
mod analysis;
mod app;
mod cache;
mod config;
mod domain;
mod http;
mod infrastructure;
mod web_content;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let shutdown = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::AnalysisApp::initialize(config, paths, shutdown).await?;
    app.run().await
}
