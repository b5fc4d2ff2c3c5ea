use std::io;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    config::{AppConfig, LogFormat},
    infrastructure::directories::ResolvedPaths,
};

static INIT: OnceCell<()> = OnceCell::new();
static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

pub fn init_tracing(config: &AppConfig, paths: &ResolvedPaths) -> Result<()> {
    INIT.get_or_try_init::<_, anyhow::Error>(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.logging.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, "analysis.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        let _ = GUARD.set(guard);

        let json = config.logging.format == LogFormat::Json;
        let console_text = (!json).then(|| {
            fmt::layer()
                .with_writer(io::stdout)
                .with_target(true)
                .with_ansi(true)
        });
        let console_json = json.then(|| {
            fmt::layer()
                .json()
                .with_writer(io::stdout)
                .with_target(true)
                .with_current_span(false)
        });

        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_text)
            .with(console_json)
            .with(file_layer)
            .init();

        tracing::info!(
            logs = %paths.logs_dir.display(),
            format = ?config.logging.format,
            "tracing initialized"
        );
        Ok(())
    })?;
    Ok(())
}
