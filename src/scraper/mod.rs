pub mod cache;
pub mod cascade;
pub mod error;
pub mod fetch;
pub mod fields;
pub mod normalize;
pub mod types;

use futures::future::join_all;
use serde::Serialize;

use self::cache::{cache_key, MediaCache};
use self::cascade::run_cascade;
use self::error::ExtractError;
use self::fetch::{backoff_delay, browser_headers, classify_response, DocumentFetcher, Sleeper};
use self::types::MediaRecord;
use crate::config::ExtractorConfig;
use crate::utils::instagram::{extract_post_id, is_valid_post_url};
use crate::utils::time::now_millis;

/// Outcome of one URL in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MediaRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

/// Orchestrator: validate -> cache -> fetch -> classify -> cascade, with linear backoff.
pub struct Extractor<'a> {
    fetcher: &'a dyn DocumentFetcher,
    cache: &'a dyn MediaCache,
    sleeper: &'a dyn Sleeper,
    config: ExtractorConfig,
}

impl<'a> Extractor<'a> {
    pub fn new(
        fetcher: &'a dyn DocumentFetcher,
        cache: &'a dyn MediaCache,
        sleeper: &'a dyn Sleeper,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub async fn extract(&self, url: &str) -> Result<MediaRecord, ExtractError> {
        let url = url.trim();
        let post_id = match extract_post_id(url) {
            Some(id) if is_valid_post_url(url) => id,
            _ => return Err(ExtractError::InvalidUrl(url.to_string())),
        };
        log::info!("[scraper] extracting post_id={}", post_id);

        let key = cache_key(&post_id);
        if let Some(cached) = self.cache.get(&key).await {
            log::info!("[scraper] cache HIT for {}", post_id);
            return Ok(cached);
        }

        let attempts = self.config.max_retries + 1;
        let mut last_error = ExtractError::NotFound;

        for attempt in 1..=attempts {
            match self.attempt(url, attempt).await {
                Ok(record) => {
                    log::info!(
                        "[scraper] extracted {} on attempt {} (type={:?}, author={})",
                        post_id,
                        attempt,
                        record.media_type,
                        record.author
                    );
                    self.cache.set(&key, &record, self.config.cache_ttl).await;
                    return Ok(record);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    log::warn!("[scraper] attempt {}/{} for {} failed: {}", attempt, attempts, post_id, e);
                    last_error = e;
                }
            }

            if attempt < attempts {
                let delay = backoff_delay(attempt, self.config.retry_delay);
                log::debug!("[scraper] retrying {} in {:?}", post_id, delay);
                self.sleeper.sleep(delay).await;
            }
        }

        Err(ExtractError::ExtractionFailed {
            attempts,
            cause: Box::new(last_error),
        })
    }

    async fn attempt(&self, url: &str, attempt: u32) -> Result<MediaRecord, ExtractError> {
        let headers = browser_headers(now_millis().wrapping_add(attempt as u64));
        let doc = self
            .fetcher
            .fetch_document(url, &headers, self.config.fetch_timeout)
            .await?;

        classify_response(&doc)?;
        run_cascade(&doc.body, url, &self.config.policy).ok_or(ExtractError::NotFound)
    }

    /// Extracts every URL independently; one failure never affects the others.
    pub async fn extract_batch(&self, urls: &[String]) -> BatchReport {
        let results: Vec<BatchItem> = join_all(urls.iter().map(|url| async move {
            match self.extract(url).await {
                Ok(record) => BatchItem {
                    url: url.clone(),
                    success: true,
                    data: Some(record),
                    error: None,
                    error_kind: None,
                },
                Err(e) => BatchItem {
                    url: url.clone(),
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                },
            }
        }))
        .await;

        let successful = results.iter().filter(|r| r.success).count();
        BatchReport {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }
}
