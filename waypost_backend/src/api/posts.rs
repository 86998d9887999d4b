use super::{require_user, ApiError, ApiResult, AppState};
use crate::photos::{PhotoService, SavePhotoInput};
use crate::posts::{CreatePostInput, PostService, PostView};
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ListPostsParams {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub(crate) async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> ApiResult<Vec<PostView>> {
    let service = PostService::new(state.database.clone());
    let limit = params.limit.unwrap_or(50).min(200);
    let posts = service.list_feed(params.user_id.as_deref(), limit)?;
    Ok(Json(posts))
}

/// Upload flow: a `json` part with caption/location plus a `photo` part.
/// The post only lands together with its photo.
pub(crate) async fn create_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let user_id = require_user(&state, &headers)?;

    let mut input: Option<CreatePostInput> = None;
    let mut photo: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "json" {
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
            let parsed: CreatePostInput =
                serde_json::from_slice(&data).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            input = Some(parsed);
        } else if name == "photo" {
            let original_name = field.file_name().map(|n| n.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
            photo = Some((original_name, data.to_vec()));
        }
    }

    let mut input = input.ok_or(ApiError::BadRequest("missing json field".into()))?;
    let (original_name, data) =
        photo.ok_or(ApiError::BadRequest("missing photo field".into()))?;
    // Reject bad photo bytes before the post row exists; otherwise a
    // failed upload would strand a photo-less post in the feed.
    crate::photos::sniff_image(&data).map_err(|err| ApiError::BadRequest(err.to_string()))?;
    input.author_id = user_id;

    let post_service = PostService::new(state.database.clone());
    let mut post = match post_service.create_post(input) {
        Ok(post) => post,
        Err(err) if err.to_string().contains("may not be empty") => {
            return Err(ApiError::BadRequest(err.to_string()));
        }
        Err(err) => return Err(ApiError::Internal(err)),
    };

    let photo_service = PhotoService::new(state.database.clone(), state.config.paths.clone());
    let photo_view = photo_service
        .save_photo(SavePhotoInput {
            post_id: Some(post.id.clone()),
            original_name,
            data,
        })
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    post.photos.push(photo_view);

    Ok((StatusCode::CREATED, Json(post)))
}
