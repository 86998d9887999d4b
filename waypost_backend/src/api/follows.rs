use super::{require_user, ApiError, ApiResult, AppState};
use crate::follows::{FollowCounts, FollowError, FollowService, SuggestedUserView};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct SuggestionsParams {
    #[serde(default)]
    limit: Option<usize>,
}

pub(crate) async fn follow_handler(
    State(state): State<AppState>,
    Path(followed_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let follower_id = require_user(&state, &headers)?;
    let service = FollowService::new(state.database.clone());
    match service.follow(&follower_id, &followed_id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(FollowError::UnknownUser) => {
            Err(ApiError::NotFound(format!("user {followed_id} not found")))
        }
        Err(err @ FollowError::SelfFollow) => Err(ApiError::BadRequest(err.to_string())),
        Err(FollowError::Store(inner)) => Err(ApiError::Internal(inner)),
    }
}

pub(crate) async fn unfollow_handler(
    State(state): State<AppState>,
    Path(followed_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let follower_id = require_user(&state, &headers)?;
    let service = FollowService::new(state.database.clone());
    service
        .unfollow(&follower_id, &followed_id)
        .map_err(ApiError::Internal)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn counts_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<FollowCounts> {
    let service = FollowService::new(state.database.clone());
    let counts = service.counts(&user_id)?;
    Ok(Json(counts))
}

pub(crate) async fn suggestions_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestionsParams>,
    headers: HeaderMap,
) -> ApiResult<Vec<SuggestedUserView>> {
    let user_id = require_user(&state, &headers)?;
    let limit = params.limit.unwrap_or(20).min(100);
    let service = FollowService::new(state.database.clone());
    let suggestions = service.suggestions(&user_id, limit)?;
    Ok(Json(suggestions))
}
