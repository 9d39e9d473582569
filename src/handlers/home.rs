use serde_json::json;
use worker::*;

use crate::config::ExtractorConfig;

use super::json_response;

pub fn handle(_req: Request, _ctx: RouteContext<ExtractorConfig>) -> Result<Response> {
    let descriptor = json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /api/media?url=": "full media record for a post or reel",
            "GET /api/info?url=": "metadata only, direct media URLs removed",
            "POST /api/batch": "{\"urls\": [...]} extracted independently",
            "GET /health": "liveness check",
        },
    });
    json_response(&descriptor, 200)
}

pub fn health(_req: Request, _ctx: RouteContext<ExtractorConfig>) -> Result<Response> {
    json_response(&json!({ "status": "ok" }), 200)
}
