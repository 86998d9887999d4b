use super::{require_user, ApiError, ApiResult, AppState};
use crate::locations::{LocationError, LocationSampleView, LocationService, RecordLocationInput};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

pub(crate) async fn record_location_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut input): Json<RecordLocationInput>,
) -> ApiResult<LocationSampleView> {
    let user_id = require_user(&state, &headers)?;
    input.user_id = user_id;

    let service = LocationService::new(state.database.clone());
    match service.record_sample(input) {
        Ok(view) => Ok(Json(view)),
        Err(
            err @ (LocationError::LatitudeOutOfRange
            | LocationError::LongitudeOutOfRange
            | LocationError::SharingDisabled),
        ) => Err(ApiError::BadRequest(err.to_string())),
        Err(err @ LocationError::UnknownUser) => Err(ApiError::NotFound(err.to_string())),
        Err(LocationError::Store(inner)) => Err(ApiError::Internal(inner)),
    }
}

pub(crate) async fn friend_locations_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<LocationSampleView>> {
    let user_id = require_user(&state, &headers)?;
    let service = LocationService::new(state.database.clone());
    let samples = service.friend_samples(&user_id)?;
    Ok(Json(samples))
}
