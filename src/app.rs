use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::{redirect, Client};
use tokio::{net::TcpListener, time::timeout};

use crate::{
    ai::ChatCompletionsClient,
    analysis::{Analyzer, AnalyzerSettings},
    cache::{CacheStore, MemoryStore, ResultCache, SqliteStore},
    config::{AppConfig, CacheBackend},
    http::{build_router, ApiState},
    infrastructure::{
        directories::ResolvedPaths,
        shutdown::{Shutdown, StopReason},
    },
    web_content::WebContentFetcher,
};

const MAX_REDIRECTS: usize = 10;

pub struct AnalysisApp {
    _paths: ResolvedPaths,
    config: Arc<AppConfig>,
    analyzer: Arc<Analyzer>,
    shutdown: Shutdown,
}

impl AnalysisApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let http_client = Client::builder()
            .user_agent(format!("dymis-rust/{}", env!("CARGO_PKG_VERSION")))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        let judge = Arc::new(ChatCompletionsClient::new(
            http_client.clone(),
            config.judge.clone(),
        ));
        if config.judge.api_key.is_none() {
            tracing::warn!(
                target: "config",
                "no judgment API key configured; every analysis will be degraded"
            );
        }
        let extractor = Arc::new(WebContentFetcher::new(http_client, config.web.clone()));

        let store: Arc<dyn CacheStore> = match config.cache.backend {
            CacheBackend::Sqlite => Arc::new(SqliteStore::open(&paths.cache_db_path).await?),
            CacheBackend::Memory => Arc::new(MemoryStore::new()),
        };
        let cache = ResultCache::new(store, config.cache.ttl);
        tracing::info!(
            target: "cache",
            backend = ?config.cache.backend,
            ttl = ?cache.ttl(),
            "result cache ready"
        );

        let analyzer = Arc::new(Analyzer::new(
            extractor,
            judge,
            cache,
            AnalyzerSettings {
                judge_timeout: config.judge.timeout,
                cache_degraded: config.cache.cache_degraded,
                ..AnalyzerSettings::default()
            },
        ));

        Ok(Self {
            _paths: paths,
            config,
            analyzer,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let AnalysisApp {
            _paths: _,
            config,
            analyzer,
            shutdown,
        } = self;

        let router = build_router(
            ApiState::new(analyzer.clone(), &config.server.api_key),
            &config.server.allowed_origins,
        );
        let listener = TcpListener::bind(config.server.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
        tracing::info!(addr = %config.server.bind_addr, "analysis service listening");

        let stopped = shutdown.stopped();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let reason = stopped.await;
                tracing::info!(target: "lifecycle", %reason, "draining in-flight requests");
            })
            .await;
        if let Err(err) = &served {
            tracing::error!(target: "http", error = %err, "server stopped with error");
        }
        shutdown.trigger(StopReason::ServerExited);

        let shutdown_timeout = Duration::from_secs(5);
        if timeout(shutdown_timeout, analyzer.cache().close()).await.is_err() {
            tracing::warn!(
                target: "cache",
                "cache store did not close within {:?}",
                shutdown_timeout
            );
        }

        tracing::info!(reason = ?shutdown.reason(), "analysis service stopped");
        served.context("HTTP server failed")
    }
}
