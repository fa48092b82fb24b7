//! # Equindex Web
//!
//! A small read-only dashboard over the price store.
//!
//! Serves an embedded chart page at `/` and a JSON API under `/api/`:
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /` | Interactive dashboard page |
//! | `GET /api/health` | Liveness probe |
//! | `GET /api/performance` | Full index series |
//! | `GET /api/summary` | Series plus derived returns and change markers |
//! | `GET /api/composition/dates` | Rebalance dates |
//! | `GET /api/composition/:date` | Constituent weights for a date |
//!
//! There is no write path; the store handle is opened by the caller and
//! only ever read here.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use equindex_store::PriceStore;
use tower_http::cors::{Any, CorsLayer};

pub use error::WebError;

/// Shared state available to every handler.
pub struct AppState {
    pub store: PriceStore,
}

/// Assemble the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index_page))
        .route("/api/health", get(handlers::health))
        .route("/api/performance", get(handlers::performance))
        .route("/api/summary", get(handlers::summary))
        .route("/api/composition/dates", get(handlers::composition_dates))
        .route("/api/composition/:date", get(handlers::composition_for_date))
        .with_state(state)
        .layer(cors)
}

/// Bind to localhost and serve until the process is stopped.
pub async fn run_server(store: PriceStore, port: u16) -> Result<(), WebError> {
    let state = Arc::new(AppState { store });
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("dashboard listening on http://{addr}/");
    axum::serve(listener, app).await?;
    Ok(())
}
