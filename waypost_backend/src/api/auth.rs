use super::{bearer_token, ApiError, ApiResult, AppState};
use crate::auth::{AuthError, AuthService, LoginInput, RegisterInput, SessionView};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::MissingFields => ApiError::BadRequest(err.to_string()),
        AuthError::UsernameTaken => ApiError::BadRequest(err.to_string()),
        AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
        AuthError::Store(inner) => ApiError::Internal(inner),
    }
}

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<SessionView> {
    let service = AuthService::new(state.database.clone());
    let session = service.register(input).map_err(map_auth_error)?;
    Ok(Json(session))
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> ApiResult<SessionView> {
    let service = AuthService::new(state.database.clone());
    let session = service.login(input).map_err(map_auth_error)?;
    Ok(Json(session))
}

pub(crate) async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        AuthService::new(state.database.clone())
            .logout(&token)
            .map_err(ApiError::Internal)?;
    }
    Ok(StatusCode::NO_CONTENT)
}
