use super::{optional_user, require_user, ApiError, ApiResult, AppState};
use crate::challenges::{ChallengeService, ChallengeView};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct CompletionResponse {
    challenge_id: String,
    newly_completed: bool,
}

pub(crate) async fn list_challenges_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<ChallengeView>> {
    let user_id = optional_user(&state, &headers)?;
    let service = ChallengeService::new(state.database.clone());
    let challenges = service.list(user_id.as_deref())?;
    Ok(Json(challenges))
}

pub(crate) async fn complete_challenge_handler(
    State(state): State<AppState>,
    Path(challenge_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<CompletionResponse> {
    let user_id = require_user(&state, &headers)?;
    let service = ChallengeService::new(state.database.clone());
    match service.complete(&user_id, &challenge_id) {
        Ok(newly_completed) => Ok(Json(CompletionResponse {
            challenge_id,
            newly_completed,
        })),
        Err(err) if err.to_string().contains("not found") => Err(ApiError::NotFound(format!(
            "challenge {challenge_id} not found"
        ))),
        Err(err) => Err(ApiError::Internal(err)),
    }
}
