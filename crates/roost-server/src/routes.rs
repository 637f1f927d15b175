//! Route definitions and response shapes.
//!
//! Three read-only endpoints with fixed JSON contracts. CORS is wide open:
//! the only intended caller is the shell's own WebView, and the sample
//! surface carries nothing sensitive.

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    server: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct HelloResponse {
    message: String,
    timestamp: DateTime<Utc>,
}

/// Build the API router.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(status))
        .route("/api/status", get(status))
        .route("/api/info", get(info))
        .route("/api/hello/{name}", get(hello))
        .layer(cors)
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: "Roost API server running",
        timestamp: Utc::now(),
    })
}

async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        server: "roost-server",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

async fn hello(Path(name): Path<String>) -> Json<HelloResponse> {
    Json(HelloResponse {
        message: format!("Hello, {name}!"),
        timestamp: Utc::now(),
    })
}
