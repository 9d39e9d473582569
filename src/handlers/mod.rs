pub mod batch;
pub mod home;
pub mod media;

use std::sync::OnceLock;

use serde::Serialize;
use url::Url;
use worker::*;

use crate::config::ExtractorConfig;
use crate::scraper::cache::{KvCache, MediaCache, MemoryCache};
use crate::scraper::error::ExtractError;
use crate::scraper::fetch::{WorkerFetcher, WorkerSleeper};
use crate::scraper::Extractor;

/// Fallback cache for deployments without a KV binding. Lives as long as the isolate.
static MEMORY_CACHE: OnceLock<MemoryCache> = OnceLock::new();

/// Per-request wiring of config and cache backend.
pub struct Services {
    config: ExtractorConfig,
    kv: Option<KvCache>,
}

impl Services {
    /// Wires the config read once per request in the fetch entry point.
    pub fn from_context(ctx: &RouteContext<ExtractorConfig>) -> Self {
        Self {
            config: ctx.data.clone(),
            kv: KvCache::from_env(&ctx.env),
        }
    }

    pub fn extractor(&self) -> Extractor<'_> {
        let cache: &dyn MediaCache = match &self.kv {
            Some(kv) => kv,
            None => MEMORY_CACHE.get_or_init(MemoryCache::new),
        };
        Extractor::new(&WorkerFetcher, cache, &WorkerSleeper, self.config.clone())
    }
}

/// Serializes `body` as a JSON response with permissive CORS.
pub fn json_response<T: Serialize>(body: &T, status: u16) -> Result<Response> {
    let body = serde_json::to_string(body)
        .map_err(|e| Error::RustError(format!("JSON serialization error: {e}")))?;

    let headers = cors_headers()?;
    headers.set("Content-Type", "application/json")?;

    Ok(Response::ok(body)?.with_status(status).with_headers(headers))
}

fn cors_headers() -> Result<Headers> {
    let headers = Headers::new();
    headers.set("Access-Control-Allow-Origin", "*")?;
    headers.set("Access-Control-Allow-Methods", "GET, POST, OPTIONS")?;
    headers.set("Access-Control-Allow-Headers", "Content-Type")?;
    Ok(headers)
}

pub fn error_body(message: &str, kind: &str, status: u16) -> Result<Response> {
    let body = serde_json::json!({
        "success": false,
        "error": message,
        "errorKind": kind,
    });
    json_response(&body, status)
}

pub fn extract_error_response(err: &ExtractError) -> Result<Response> {
    error_body(&err.to_string(), err.kind(), err.status_code())
}

/// Answers CORS preflight requests.
pub fn preflight(_req: Request, _ctx: RouteContext<ExtractorConfig>) -> Result<Response> {
    Ok(Response::empty()?.with_status(204).with_headers(cors_headers()?))
}

/// Extracts a single query parameter value from a URL.
pub fn get_query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
