use worker::*;

use crate::config::ExtractorConfig;

mod config;
mod handlers;
mod logging;
mod scraper;
mod utils;

#[event(fetch)]
async fn fetch(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();
    let config = ExtractorConfig::from_env(&env);
    logging::init(config.log_level);

    // Strip trailing slash (except root) and redirect-internally by rewriting
    let url = req.url()?;
    let path = url.path().to_string();

    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let mut new_url = url.clone();
        new_url.set_path(trimmed);
        let new_req = Request::new_with_init(
            new_url.as_str(),
            &RequestInit {
                method: req.method(),
                headers: req.headers().clone(),
                body: req.inner().body().map(Into::into),
                ..Default::default()
            },
        )?;
        let router = build_router(config);
        return router.run(new_req, env).await;
    }

    let router = build_router(config);
    router.run(req, env).await
}

fn build_router(config: ExtractorConfig) -> Router<'static, ExtractorConfig> {
    Router::with_data(config)
        .get("/", handlers::home::handle)
        .get("/health", handlers::home::health)
        .get_async("/api/media", |req, ctx| async move {
            handlers::media::media(req, ctx).await
        })
        .get_async("/api/info", |req, ctx| async move {
            handlers::media::info(req, ctx).await
        })
        .post_async("/api/batch", |req, ctx| async move {
            handlers::batch::handle(req, ctx).await
        })
        .options("/api/media", handlers::preflight)
        .options("/api/info", handlers::preflight)
        .options("/api/batch", handlers::preflight)
}
