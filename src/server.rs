use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CACHE_CONTROL,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::ingest::Ingestor;

pub const NEWS_ROUTE: &str = "/api/news";

const FRESH_CACHE_CONTROL: &str = "public, s-maxage=300";
const OFFLINE_CACHE_CONTROL: &str = "no-store";

pub fn router(ingestor: Ingestor) -> Router {
    Router::new()
        .route(NEWS_ROUTE, get(news_handler).options(preflight_handler))
        .with_state(ingestor)
}

pub async fn serve(bind: &str, ingestor: Ingestor) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Serving news on http://{}{}", listener.local_addr()?, NEWS_ROUTE);

    axum::serve(listener, router(ingestor))
        .await
        .context("News server stopped")
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers
}

/// Always 200 with a JSON body; `success` and `offline` tell the client what happened.
async fn news_handler(State(ingestor): State<Ingestor>) -> Response {
    let response = ingestor.run().await;

    let mut headers = cors_headers();
    let cache_control = if response.success && !response.is_offline() {
        FRESH_CACHE_CONTROL
    } else {
        OFFLINE_CACHE_CONTROL
    };
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(cache_control));

    (StatusCode::OK, headers, Json(response)).into_response()
}

async fn preflight_handler() -> Response {
    (StatusCode::OK, cors_headers()).into_response()
}
