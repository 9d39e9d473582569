use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use worker::Env;

use crate::scraper::cascade::CascadePolicy;

/// Runtime knobs for the extractor, read from worker vars.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base of the linear backoff between attempts.
    pub retry_delay: Duration,
    pub fetch_timeout: Duration,
    pub cache_ttl: Duration,
    /// Most URLs accepted by one batch request.
    pub batch_limit: usize,
    pub log_level: LevelFilter,
    pub policy: CascadePolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            fetch_timeout: Duration::from_secs(15),
            cache_ttl: Duration::from_secs(600),
            batch_limit: 10,
            log_level: LevelFilter::Info,
            policy: CascadePolicy::default(),
        }
    }
}

impl ExtractorConfig {
    /// Builds a config from a variable lookup. Missing or unparseable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string());

        Self {
            max_retries: parse_or(read("MAX_RETRIES"), defaults.max_retries),
            retry_delay: read("RETRY_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            fetch_timeout: read("FETCH_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.fetch_timeout),
            cache_ttl: read("CACHE_TTL_SECONDS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            batch_limit: parse_or(read("BATCH_LIMIT"), defaults.batch_limit),
            log_level: parse_or(read("LOG_LEVEL"), defaults.log_level),
            policy: CascadePolicy {
                prefer_video_matches: parse_or(
                    read("PREFER_VIDEO_MATCHES"),
                    defaults.policy.prefer_video_matches,
                ),
                video_override: parse_or(read("VIDEO_OVERRIDE"), defaults.policy.video_override),
            },
        }
    }

    pub fn from_env(env: &Env) -> Self {
        Self::from_lookup(|name| env.var(name).ok().map(|v| v.to_string()))
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
