use crate::config::GeocodeConfig;
use anyhow::{Context, Result};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Mapbox token not configured")]
    TokenMissing,
    #[error("Internal server error")]
    Upstream(#[source] anyhow::Error),
}

/// Upstream reply, relayed verbatim to the caller on success.
#[derive(Debug, Clone)]
pub struct GeocodeReply {
    pub status: u16,
    pub body: String,
}

/// One fresh upstream round trip per call: no retry, no caching, no rate
/// limiting (the proxy is deliberately a plain forwarder).
pub async fn reverse_geocode(
    client: &reqwest::Client,
    config: &GeocodeConfig,
    latitude: f64,
    longitude: f64,
) -> Result<GeocodeReply, GeocodeError> {
    let token = config
        .mapbox_token
        .as_deref()
        .ok_or(GeocodeError::TokenMissing)?;

    let url = format!(
        "{}/geocoding/v5/mapbox.places/{longitude},{latitude}.json",
        config.api_base.trim_end_matches('/')
    );

    let response = client
        .get(&url)
        .query(&[
            ("access_token", token),
            ("types", "place,locality,neighborhood,address"),
            ("limit", "1"),
        ])
        .send()
        .await
        .context("geocoding upstream request failed")
        .map_err(GeocodeError::Upstream)?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(status = %status, "geocoding upstream returned an error");
        return Err(GeocodeError::Upstream(anyhow::anyhow!(
            "upstream status {status}"
        )));
    }

    let body = response
        .text()
        .await
        .context("failed to read geocoding upstream body")
        .map_err(GeocodeError::Upstream)?;

    Ok(GeocodeReply {
        status: status.as_u16(),
        body,
    })
}
