//! HTTP surface over the scraper.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::pipeline::Scraper;
use crate::results::{ScrapeRequest, ScrapeResponse};

#[derive(Debug, Deserialize)]
struct ScrapeBody {
    #[serde(default)]
    url: Option<String>,
}

/// Create the router: `POST /scrape` and `GET /healthz`
pub fn create_router(scraper: Arc<Scraper>) -> Router {
    Router::new()
        .route("/scrape", post(scrape))
        .route("/healthz", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(scraper)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(scraper: Scraper, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    ::log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(Arc::new(scraper))).await?;
    Ok(())
}

async fn scrape(State(scraper): State<Arc<Scraper>>, Json(body): Json<ScrapeBody>) -> Response {
    let request = match ScrapeRequest::new(body.url.as_deref().unwrap_or_default()) {
        Ok(request) => request,
        Err(e) => {
            ::log::debug!("Rejected scrape request: {}", e);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    // A dropped connection must not cancel the scrape mid-session
    let task = tokio::spawn(async move { scraper.scrape(&request).await });

    match task.await {
        Ok(result) => (StatusCode::OK, Json(ScrapeResponse { result })).into_response(),
        Err(e) => {
            ::log::error!("Scrape task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Scrape task failed" })),
            )
                .into_response()
        }
    }
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
