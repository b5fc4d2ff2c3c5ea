use std::{borrow::Cow, sync::Arc, time::Duration};

use tokio::time::timeout;

use crate::{
    ai::{interpret, Judgment, JudgmentClient},
    cache::ResultCache,
    domain::{AnalysisRequest, AnalysisResult},
    web_content::ContentExtractor,
};

use super::{
    classifier::{classify_content, ContentKind},
    error::AnalysisError,
};

pub const MIN_TEXT_LENGTH: usize = 10;

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub min_text_length: usize,
    pub judge_timeout: Duration,
    /// Store fallback results too. Off by default so a transient upstream
    /// failure is not replayed for a whole TTL.
    pub cache_degraded: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            min_text_length: MIN_TEXT_LENGTH,
            judge_timeout: Duration::from_secs(60),
            cache_degraded: false,
        }
    }
}

/// Runs one request end to end: classify, cache lookup, extract (URLs only),
/// judge, interpret, store.
pub struct Analyzer {
    extractor: Arc<dyn ContentExtractor>,
    judge: Arc<dyn JudgmentClient>,
    cache: ResultCache,
    settings: AnalyzerSettings,
}

impl Analyzer {
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        judge: Arc<dyn JudgmentClient>,
        cache: ResultCache,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            extractor,
            judge,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Every cache miss that reaches the judge yields a result. Results built
    /// from a real judgment are always stored; fallback results (judge
    /// unavailable or reply unparseable) are stored only when
    /// [`AnalyzerSettings::cache_degraded`] is set.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let content = request.content.as_str();
        if content.trim().is_empty() {
            return Err(AnalysisError::EmptyContent);
        }

        let classified = classify_content(content);
        tracing::info!(
            target: "analysis",
            kind = ?classified.kind,
            key = %classified.key,
            "starting analysis"
        );

        if let Some(cached) = self.cache.get(&classified.key).await {
            tracing::info!(target: "analysis", key = %classified.key, "returning cached result");
            return Ok(cached);
        }

        let text: Cow<'_, str> = match classified.kind {
            ContentKind::Url => Cow::Owned(self.extractor.extract(classified.target).await?),
            ContentKind::Text => Cow::Borrowed(content),
        };

        let length = text.trim().chars().count();
        if length < self.settings.min_text_length {
            return Err(AnalysisError::ContentTooShort {
                length,
                minimum: self.settings.min_text_length,
            });
        }

        let judgment = self.obtain_judgment(&text).await;
        let degraded = judgment.is_degraded();
        let result = AnalysisResult::new(
            judgment.trust_score,
            judgment.summary,
            content,
            judgment.findings,
        );

        if !degraded || self.settings.cache_degraded {
            self.cache.put(&classified.key, &result).await;
        } else {
            tracing::info!(
                target: "analysis",
                key = %classified.key,
                outcome = ?judgment.outcome,
                "degraded result not cached"
            );
        }

        tracing::info!(
            target: "analysis",
            trust_score = result.trust_score.value(),
            degraded,
            "analysis completed"
        );
        Ok(result)
    }

    async fn obtain_judgment(&self, text: &str) -> Judgment {
        match timeout(self.settings.judge_timeout, self.judge.judge(text)).await {
            Ok(Ok(raw)) => interpret(&raw),
            Ok(Err(err)) => {
                tracing::error!(target: "analysis", error = %err, "judgment request failed");
                Judgment::unavailable(&err.to_string())
            }
            Err(_) => {
                tracing::error!(
                    target: "analysis",
                    timeout = ?self.settings.judge_timeout,
                    "judgment request timed out"
                );
                Judgment::unavailable("judgment request timed out")
            }
        }
    }
}
