//! HTTP error mapping
//!
//! The settlement taxonomy maps onto statuses here and nowhere else:
//! Validation 400, Auth 403, State 400 (frozen wallet 403), Provider and
//! Persistence 500. A missing identity header is 401. Response bodies carry
//! the taxonomy kind and the safe message; the full error text is logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use wallet_settlement::{ErrorKind, StateError};

/// API-boundary error
#[derive(Debug)]
pub enum ApiError {
    /// `x-user-id` header absent
    MissingIdentity,
    /// Settlement operation failed
    Settlement(wallet_settlement::Error),
}

impl From<wallet_settlement::Error> for ApiError {
    fn from(err: wallet_settlement::Error) -> Self {
        ApiError::Settlement(err)
    }
}

/// Wire shape of an error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Taxonomy kind, e.g. `validation`, `auth`
    pub error: String,
    /// Safe human-readable message
    pub message: String,
}

fn status_for(err: &wallet_settlement::Error) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Auth => StatusCode::FORBIDDEN,
        ErrorKind::State => match err {
            wallet_settlement::Error::State(StateError::WalletFrozen) => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        },
        ErrorKind::Provider => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "auth".to_string(),
                    message: "x-user-id header is required".to_string(),
                },
            ),
            ApiError::Settlement(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                } else {
                    tracing::warn!(error = %err, "Request refused");
                }
                (
                    status,
                    ErrorBody {
                        error: err.kind().as_str().to_string(),
                        message: err.safe_message(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
