use std::time::Duration;

use async_trait::async_trait;
use futures::future::{select, Either};
use worker::*;

use super::error::{BlockReason, ExtractError};

/// Desktop and mobile browser user agents rotated across requests.
const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
];

const LOGIN_WALL_MARKERS: [&str; 4] = [
    "Login • Instagram",
    "LoginAndSignupPage",
    "\"requires_to_login\":true",
    "not-logged-in",
];

const AGE_RESTRICTION_MARKERS: [&str; 3] = [
    "age-restricted",
    "You must be 18 years old",
    "restricted_media",
];

/// A fetched page. 4xx responses are returned as-is for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

/// The only network dependency of the extractor.
#[async_trait(?Send)]
pub trait DocumentFetcher {
    async fn fetch_document(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        timeout: Duration,
    ) -> std::result::Result<FetchedDocument, ExtractError>;
}

/// Pause between attempts.
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Linear backoff: the delay before retry `n` is `n × base`.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base * attempt
}

/// Browser-like request headers. `seed` picks the user agent.
pub fn browser_headers(seed: u64) -> Vec<(&'static str, String)> {
    let user_agent = USER_AGENTS[(seed % USER_AGENTS.len() as u64) as usize];
    vec![
        ("User-Agent", user_agent.to_string()),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
                .to_string(),
        ),
        ("Accept-Language", "en-US,en;q=0.9".to_string()),
        ("Cache-Control", "no-cache".to_string()),
        ("Pragma", "no-cache".to_string()),
        ("Sec-Fetch-Dest", "document".to_string()),
        ("Sec-Fetch-Mode", "navigate".to_string()),
        ("Sec-Fetch-Site", "none".to_string()),
        ("Sec-Fetch-User", "?1".to_string()),
        ("Upgrade-Insecure-Requests", "1".to_string()),
    ]
}

/// Decides whether a fetched page is worth running the cascade on.
pub fn classify_response(doc: &FetchedDocument) -> std::result::Result<(), ExtractError> {
    match doc.status {
        404 => return Err(ExtractError::NotFound),
        429 => return Err(ExtractError::Blocked(BlockReason::RateLimited)),
        s if s >= 500 => return Err(ExtractError::Transport(format!("HTTP {s}"))),
        s if s >= 400 => return Err(ExtractError::Blocked(BlockReason::HttpStatus(s))),
        _ => {}
    }

    if LOGIN_WALL_MARKERS.iter().any(|m| doc.body.contains(m)) {
        return Err(ExtractError::Blocked(BlockReason::LoginWall));
    }
    if AGE_RESTRICTION_MARKERS.iter().any(|m| doc.body.contains(m)) {
        return Err(ExtractError::Blocked(BlockReason::AgeRestricted));
    }
    Ok(())
}

/// Fetches pages with the Workers `fetch` API.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerFetcher;

impl WorkerFetcher {
    async fn send(
        url: &str,
        headers: &[(&'static str, String)],
        signal: &AbortSignal,
    ) -> Result<FetchedDocument> {
        let request_headers = Headers::new();
        for (name, value) in headers {
            request_headers.set(name, value)?;
        }

        let mut init = RequestInit::new();
        init.with_method(Method::Get).with_headers(request_headers);

        let request = Request::new_with_init(url, &init)?;
        let mut resp = Fetch::Request(request).send_with_signal(signal).await?;

        let status = resp.status_code();
        let headers = resp.headers().entries().collect();
        let body = resp.text().await?;
        Ok(FetchedDocument { status, body, headers })
    }
}

#[async_trait(?Send)]
impl DocumentFetcher for WorkerFetcher {
    async fn fetch_document(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        timeout: Duration,
    ) -> std::result::Result<FetchedDocument, ExtractError> {
        let controller = AbortController::default();
        let signal = controller.signal();
        let fetch = Box::pin(Self::send(url, headers, &signal));
        let deadline = Box::pin(Delay::from(timeout));

        let doc = match select(fetch, deadline).await {
            Either::Left((result, _)) => {
                result.map_err(|e| ExtractError::Transport(e.to_string()))?
            }
            Either::Right(_) => {
                controller.abort();
                log::warn!("[fetch] timed out after {:?}: {}", timeout, url);
                return Err(ExtractError::Transport(format!(
                    "timed out after {}ms",
                    timeout.as_millis()
                )));
            }
        };

        log::debug!("[fetch] status={} body_len={} for {}", doc.status, doc.body.len(), url);
        if doc.status >= 500 {
            return Err(ExtractError::Transport(format!("HTTP {}", doc.status)));
        }
        Ok(doc)
    }
}

/// Sleeps with a Workers timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerSleeper;

#[async_trait(?Send)]
impl Sleeper for WorkerSleeper {
    async fn sleep(&self, duration: Duration) {
        Delay::from(duration).await;
    }
}
