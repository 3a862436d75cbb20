use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use tact_core::Category;

use super::{map_store_error, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

pub(super) async fn list_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let category: Category = category
        .parse()
        .map_err(|msg: String| ApiError::new(req_id.0.clone(), "not_found", msg))?;

    let images = state
        .reference
        .list_active(category)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::ok(req_id.0, images)))
}

pub(super) async fn list_governorates(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let governorates = state
        .reference
        .list_governorates()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::ok(req_id.0, governorates)))
}
