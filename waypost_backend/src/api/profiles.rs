use super::{require_user, ApiError, ApiResult, AppState};
use crate::photos::{PhotoService, SavePhotoInput};
use crate::profiles::{ProfileService, ProfileView, UpdateSettingsInput};
use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
    })
}

pub(crate) async fn get_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ProfileView> {
    let service = ProfileService::new(state.database.clone());
    match service.get_profile(&id)? {
        Some(profile) => Ok(Json(profile)),
        None => Err(ApiError::NotFound(format!("profile {id} not found"))),
    }
}

pub(crate) async fn update_settings_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<UpdateSettingsInput>,
) -> ApiResult<ProfileView> {
    let user_id = require_user(&state, &headers)?;
    let service = ProfileService::new(state.database.clone());
    let profile = service
        .update_settings(&user_id, input)
        .map_err(ApiError::Internal)?;
    Ok(Json(profile))
}

pub(crate) async fn upload_avatar_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<ProfileView> {
    let user_id = require_user(&state, &headers)?;

    let mut upload: Option<(Option<String>, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?
    {
        if field.name() == Some("photo") {
            let original_name = field.file_name().map(|n| n.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
            upload = Some((original_name, data.to_vec()));
        }
    }
    let (original_name, data) =
        upload.ok_or(ApiError::BadRequest("missing photo field".into()))?;

    let photo_service = PhotoService::new(state.database.clone(), state.config.paths.clone());
    let photo = photo_service
        .save_photo(SavePhotoInput {
            post_id: None,
            original_name,
            data,
        })
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let profile_service = ProfileService::new(state.database.clone());
    profile_service
        .set_avatar(&user_id, &photo.id)
        .map_err(ApiError::Internal)?;
    match profile_service.get_profile(&user_id)? {
        Some(profile) => Ok(Json(profile)),
        None => Err(ApiError::NotFound("profile not found".into())),
    }
}
