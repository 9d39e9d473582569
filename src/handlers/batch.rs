use serde::Deserialize;
use worker::*;

use crate::config::ExtractorConfig;

use super::{error_body, json_response, Services};

#[derive(Debug, Deserialize)]
struct BatchRequest {
    urls: Vec<String>,
}

/// Batch handler.
///
/// Route: `POST /api/batch` with `{"urls": [...]}`
pub async fn handle(mut req: Request, ctx: RouteContext<ExtractorConfig>) -> Result<Response> {
    let body: BatchRequest = match req.json().await {
        Ok(body) => body,
        Err(e) => {
            log::debug!("[handler] bad batch body: {}", e);
            return error_body("body must be JSON of the form {\"urls\": [...]}", "invalid_request", 400);
        }
    };

    let services = Services::from_context(&ctx);
    let extractor = services.extractor();
    let limit = extractor.config().batch_limit;

    if body.urls.is_empty() {
        return error_body("`urls` must contain at least one URL", "invalid_request", 400);
    }
    if body.urls.len() > limit {
        return error_body(
            &format!("at most {limit} URLs per batch, got {}", body.urls.len()),
            "invalid_request",
            400,
        );
    }

    let report = extractor.extract_batch(&body.urls).await;
    log::info!(
        "[handler] batch done: total={} successful={} failed={}",
        report.total,
        report.successful,
        report.failed
    );
    json_response(&report, 200)
}
