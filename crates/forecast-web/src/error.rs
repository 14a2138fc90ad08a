//! HTTP rendering of forecast and lookup failures

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use forecast_stock::{ErrorKind, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Body of every non-2xx API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

/// Failure of an API handler
#[derive(Debug)]
pub enum ApiError {
    /// Fetching or forecasting failed
    Stock(StockError),
    /// Query string missing a field or holding a malformed one
    BadQuery(String),
    /// The forecast did not finish within the request budget
    Timeout(Duration),
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        Self::Stock(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadQuery(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Stock(err) => status_for(err.kind()),
            Self::BadQuery(_) => StatusCode::BAD_REQUEST,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::Stock(err) => ErrorResponse {
                error: err.user_message(),
                kind: Some(err.kind()),
            },
            Self::BadQuery(detail) => ErrorResponse {
                error: format!("Invalid request parameters. {detail}"),
                kind: Some(ErrorKind::InvalidInput),
            },
            Self::Timeout(limit) => ErrorResponse {
                error: format!(
                    "The forecast took longer than {}s, please try again",
                    limit.as_secs()
                ),
                kind: None,
            },
        }
    }
}

/// HTTP status for a user-facing error category
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::SymbolNotFound => StatusCode::NOT_FOUND,
        ErrorKind::NotEnoughHistory => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Engine => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Stock(err) if status.is_server_error() => {
                error!(status = status.as_u16(), error = %err, "Request failed");
            }
            Self::Stock(err) => debug!(status = status.as_u16(), error = %err, "Request rejected"),
            Self::BadQuery(detail) => debug!(%detail, "Malformed query string"),
            Self::Timeout(limit) => error!(limit_secs = limit.as_secs(), "Forecast timed out"),
        }
        (status, Json(self.body())).into_response()
    }
}
