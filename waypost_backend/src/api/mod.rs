mod auth;
mod challenges;
mod follows;
mod geocode;
mod locations;
mod photos;
mod posts;
mod profiles;
mod tours;

use crate::auth::AuthService;
use crate::config::WaypostConfig;
use crate::database::Database;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: WaypostConfig,
    pub database: Database,
    pub http_client: reqwest::Client,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(anyhow::Error),
    // 500 with a caller-visible message instead of the generic body.
    GeocodeUnavailable(String),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { error: msg }),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorResponse { error: msg }),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { error: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal server error".into(),
                    },
                )
            }
            ApiError::GeocodeUnavailable(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse { error: msg },
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Explicit session resolution: reads treat a missing or stale session as
/// anonymous, writes go through `require_user` instead.
pub(crate) fn optional_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<String>, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    AuthService::new(state.database.clone())
        .resolve_token(&token)
        .map_err(ApiError::Internal)
}

pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    optional_user(state, headers)?
        .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let port = start_port + offset;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in range {}-{}",
        start_port,
        start_port + MAX_PORT_ATTEMPTS - 1
    )
}

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state
        .config
        .upload
        .max_upload_bytes
        .unwrap_or(25 * 1024 * 1024);

    Router::new()
        .route("/health", get(profiles::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/profile/:id", get(profiles::get_profile_handler))
        .route("/profile", post(profiles::update_settings_handler))
        .route("/profile/avatar", post(profiles::upload_avatar_handler))
        .route("/posts", get(posts::list_posts_handler).post(posts::create_post_handler))
        .route("/photos/:id", get(photos::download_photo_handler))
        .route("/follows/counts/:id", get(follows::counts_handler))
        .route("/follows/suggestions", get(follows::suggestions_handler))
        .route(
            "/follows/:id",
            post(follows::follow_handler).delete(follows::unfollow_handler),
        )
        .route("/locations", post(locations::record_location_handler))
        .route("/locations/friends", get(locations::friend_locations_handler))
        .route("/tours/packages", get(tours::list_packages_handler))
        .route("/tours/guides", get(tours::list_guides_handler))
        .route("/challenges", get(challenges::list_challenges_handler))
        .route(
            "/challenges/:id/complete",
            post(challenges::complete_challenge_handler),
        )
        .route("/geocode", post(geocode::reverse_geocode_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes as usize))
        .layer(
            // Any origin; the header list is the contract clients rely on
            // for preflights.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers([
                    AUTHORIZATION,
                    HeaderName::from_static("x-client-info"),
                    HeaderName::from_static("apikey"),
                    CONTENT_TYPE,
                ]),
        )
        .with_state(state)
}

pub async fn serve_http(config: WaypostConfig, database: Database) -> Result<()> {
    let http_client = reqwest::Client::builder()
        .user_agent(concat!("Waypost/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("failed to build shared HTTP client")?;

    let state = AppState {
        config: config.clone(),
        database,
        http_client,
    };
    let router = build_router(state);

    // Try to bind to the configured port, or find the next available port
    let (listener, actual_port) = find_available_port(config.api_port).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));

    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port = actual_port,
            "Configured port was in use, bound to next available port"
        );
    }

    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
