//! Web front end for stock-forecast
//!
//! Serves a single page that charts a forecast report, plus the JSON API it
//! calls:
//!
//! - `GET /` chart page
//! - `GET /api/forecast?symbol=&validation_days=&forecast_days=`
//! - `GET /api/lookup?q=`
//! - `GET /health`

pub mod error;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::{AppState, DEFAULT_REQUEST_TIMEOUT};

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// All routes with tracing and permissive CORS
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/api/forecast", get(routes::forecast))
        .route("/api/lookup", get(routes::lookup))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
