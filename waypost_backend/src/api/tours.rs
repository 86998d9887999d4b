use super::{optional_user, ApiResult, AppState};
use crate::tours::{TourGuideView, TourPackageView, TourService};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

pub(crate) async fn list_packages_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<TourPackageView>> {
    let service = TourService::new(state.database.clone());
    let packages = service.list_packages()?;
    Ok(Json(packages))
}

pub(crate) async fn list_guides_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<TourGuideView>> {
    let authenticated = optional_user(&state, &headers)?.is_some();
    let service = TourService::new(state.database.clone());
    let guides = service.list_guides(authenticated)?;
    Ok(Json(guides))
}
