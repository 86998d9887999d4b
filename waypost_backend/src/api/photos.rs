use super::{ApiError, AppState};
use crate::photos::PhotoService;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderValue, StatusCode,
};
use axum::response::{IntoResponse, Response};
use tokio::fs::File as TokioFile;
use tokio_util::io::ReaderStream;

pub(crate) async fn download_photo_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let service = PhotoService::new(state.database.clone(), state.config.paths.clone());
    let download = service
        .prepare_download(&id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound(format!("photo {id} not found")))?;

    let file = TokioFile::open(&download.absolute_path)
        .await
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
    let stream = ReaderStream::new(file);

    let mut response = Body::from_stream(stream).into_response();
    *response.status_mut() = StatusCode::OK;
    if let Some(mime) = download.metadata.mime.as_deref() {
        if let Ok(value) = HeaderValue::from_str(mime) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
    }
    if let Some(size) = download.metadata.size_bytes {
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(size as u64));
    }
    Ok(response)
}
