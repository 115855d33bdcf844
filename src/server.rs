//! HTTP surface
//!
//! Serves `GET /api?user=<name>` as JSON and answers every other path with
//! a plain-text 404.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::data::{ContributionClient, ContributionError, ContributionResult};

/// Longest login the upstream host accepts
const MAX_USER_LEN: usize = 39;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    /// Client performing cache lookups and upstream fetches
    pub client: ContributionClient,
    /// Cache expiration in days
    pub cache_days: u64,
}

/// Query parameters of the `/api` endpoint
#[derive(Debug, Deserialize)]
pub struct ApiQuery {
    /// Login of the user whose calendar is requested
    pub user: Option<String>,
}

/// JSON body returned for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message
    pub error: String,
}

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// The `user` query parameter is absent or empty
    #[error("Missing 'user' parameter")]
    MissingParameter,

    /// The `user` query parameter is not a plausible login
    #[error("Invalid 'user' parameter")]
    InvalidParameter,

    /// Fetching the calendar failed
    #[error(transparent)]
    Contribution(#[from] ContributionError),
}

impl ApiError {
    /// HTTP status this error is reported with
    ///
    /// Upstream client and server errors are passed through; any other
    /// refused status (1xx, 2xx other than 200, 3xx) is reported as 502.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter | ApiError::InvalidParameter => StatusCode::BAD_REQUEST,
            ApiError::Contribution(ContributionError::Fetch { status }) => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::Contribution(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl ApiQuery {
    /// Returns the validated user login
    pub fn user(&self) -> Result<&str, ApiError> {
        let user = self
            .user
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ApiError::MissingParameter)?;

        if !is_valid_login(user) {
            return Err(ApiError::InvalidParameter);
        }
        Ok(user)
    }
}

/// Whether `user` looks like a login: ASCII alphanumerics and hyphens
fn is_valid_login(user: &str) -> bool {
    user.len() <= MAX_USER_LEN && user.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Builds the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api", get(contributions))
        .fallback(not_found)
        .with_state(Arc::new(state))
}

/// Serves the router on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server is running at http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn contributions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ApiQuery>, QueryRejection>,
) -> Result<Json<ContributionResult>, ApiError> {
    let Query(query) = query.map_err(|e| {
        warn!(error = %e, "Rejected malformed query string");
        ApiError::InvalidParameter
    })?;

    let user = query.user().inspect_err(|e| warn!(error = %e, "Rejected request"))?;

    info!(user, "Processing request");
    match state.client.get_data(user, state.cache_days).await {
        Ok(result) => {
            info!(user, "Successfully processed request");
            Ok(Json(result))
        }
        Err(e) => {
            error!(user, error = %e, "Error processing request");
            Err(e.into())
        }
    }
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    warn!(path = %uri, "Received invalid request");
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "404 Not Found",
    )
}
