use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tact_meta::{DispatchError, RawConversionEvent, UserData};

use super::{referer, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

/// Body of `POST /api/meta-events`. Every field is optional at the serde
/// level so a missing name is answered with our own 400, not a 422.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MetaEventRequest {
    event_name: Option<String>,
    event_source_url: Option<String>,
    #[serde(default)]
    user_data: Option<UserData>,
    #[serde(default)]
    custom_data: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub(super) struct StatusBody {
    status: &'static str,
    message: &'static str,
    timestamp: chrono::DateTime<Utc>,
}

pub(super) async fn status() -> impl IntoResponse {
    Json(StatusBody {
        status: "ok",
        message: "Meta Events API is running",
        timestamp: Utc::now(),
    })
}

/// Relays one browser-originated event to the Conversions API so the access
/// token never reaches the browser.
pub(super) async fn send_event(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<MetaEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| {
        ApiError::new(req_id.0.clone(), "bad_request", format!("invalid JSON body: {e}"))
    })?;

    let event_name = body
        .event_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "bad_request", "Event name is required"))?;

    let user_data = body.user_data.unwrap_or_default();
    tracing::info!(
        request_id = %req_id.0,
        event_name = %event_name,
        has_phone = user_data.has_phone(),
        has_city = user_data.has_city(),
        "relaying conversion event"
    );

    let mut event = RawConversionEvent::new(event_name).with_user_data(user_data);
    event.event_source_url = body
        .event_source_url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| referer(&headers));
    event.custom_data = body.custom_data.unwrap_or_default();

    match state.conversions.dispatch(&event).await {
        Ok(outcome) => Ok(Json(
            ApiResponse::ok(req_id.0, outcome.body).with_message("Event sent successfully"),
        )),
        Err(DispatchError::Validation(msg)) => Err(ApiError::new(req_id.0, "bad_request", msg)),
        Err(e @ DispatchError::Configuration(_)) => {
            tracing::error!(error = %e, "conversion relay is not configured");
            Err(ApiError::new(
                req_id.0,
                "not_configured",
                "Meta Conversions API is not configured",
            ))
        }
        Err(e) => {
            tracing::warn!(error = %e, "conversion relay failed");
            Err(ApiError::new(req_id.0, "dispatch_failed", e.to_string()))
        }
    }
}
