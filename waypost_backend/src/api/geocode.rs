use super::{ApiError, AppState};
use crate::geocode::{self, GeocodeError};
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeRequest {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

/// Thin relay in front of the Mapbox reverse-geocoding API. The token
/// stays server-side; a successful upstream body passes through
/// untouched so clients parse the Mapbox shape directly.
pub(crate) async fn reverse_geocode_handler(
    State(state): State<AppState>,
    Json(request): Json<GeocodeRequest>,
) -> Result<Response, ApiError> {
    let (Some(latitude), Some(longitude)) = (request.latitude, request.longitude) else {
        return Err(ApiError::BadRequest(
            "Latitude and longitude are required".into(),
        ));
    };

    let reply = geocode::reverse_geocode(
        &state.http_client,
        &state.config.geocode,
        latitude,
        longitude,
    )
    .await
    .map_err(|err| match err {
        GeocodeError::TokenMissing => {
            tracing::error!("geocoding requested without a configured token");
            ApiError::GeocodeUnavailable("Mapbox token not configured".into())
        }
        GeocodeError::Upstream(source) => {
            tracing::error!(error = ?source, "geocoding upstream failure");
            ApiError::GeocodeUnavailable("Internal server error".into())
        }
    })?;

    let mut response = reply.body.into_response();
    *response.status_mut() =
        StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}
