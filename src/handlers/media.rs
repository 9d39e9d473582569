use serde_json::json;
use worker::*;

use crate::config::ExtractorConfig;

use super::{error_body, extract_error_response, get_query_param, json_response, Services};

/// Full record handler.
///
/// Route: `/api/media?url=<post url>`
pub async fn media(req: Request, ctx: RouteContext<ExtractorConfig>) -> Result<Response> {
    respond(req, &ctx, false).await
}

/// Metadata-only handler: same record with every direct media URL stripped.
///
/// Route: `/api/info?url=<post url>`
pub async fn info(req: Request, ctx: RouteContext<ExtractorConfig>) -> Result<Response> {
    respond(req, &ctx, true).await
}

async fn respond(req: Request, ctx: &RouteContext<ExtractorConfig>, info_only: bool) -> Result<Response> {
    let req_url = req.url().map_err(|e| Error::RustError(e.to_string()))?;

    let target = match get_query_param(&req_url, "url") {
        Some(url) if !url.trim().is_empty() => url,
        _ => return error_body("missing `url` query parameter", "invalid_url", 400),
    };

    let services = Services::from_context(ctx);
    match services.extractor().extract(&target).await {
        Ok(record) => {
            let record = if info_only { record.to_info_view() } else { record };
            json_response(&json!({ "success": true, "data": record }), 200)
        }
        Err(e) => {
            log::warn!("[handler] {} failed for {}: {}", req_url.path(), target, e);
            extract_error_response(&e)
        }
    }
}
