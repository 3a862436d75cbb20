use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tact_core::{
    reduce, ContactForm, Dimensions, KitchenShape, LeadId, Material, Step, WizardAction,
    WizardState, MAX_DESIGNS,
};
use tact_funnel::SubmissionError;

use super::{map_store_error, referer, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

/// A finished wizard as the browser holds it, plus the page it was on.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LeadRequest {
    #[serde(alias = "kitchenType")]
    kitchen_shape: Option<KitchenShape>,
    #[serde(default)]
    dimensions: Dimensions,
    #[serde(default, alias = "selectedDesigns")]
    selected_design_ids: Vec<String>,
    material: Option<Material>,
    #[serde(default, alias = "phone")]
    contact_phone: String,
    governorate: Option<String>,
    page_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ContactRequest {
    #[serde(flatten)]
    form: ContactForm,
    page_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedLead {
    id: LeadId,
}

impl LeadRequest {
    /// Replays the request through the wizard reducer so the same transition
    /// rules apply as in an interactive session.
    fn into_state(self) -> WizardState {
        let mut actions = Vec::with_capacity(self.selected_design_ids.len() + 6);
        if let Some(shape) = self.kitchen_shape {
            actions.push(WizardAction::SetShape(shape));
        }
        actions.push(WizardAction::SetDimensions(self.dimensions));
        actions.extend(
            self.selected_design_ids
                .into_iter()
                .map(WizardAction::ToggleDesign),
        );
        if let Some(material) = self.material {
            actions.push(WizardAction::SetMaterial(material));
        }
        actions.push(WizardAction::SetPhone(self.contact_phone));
        if let Some(governorate) = self.governorate.filter(|g| !g.trim().is_empty()) {
            actions.push(WizardAction::SetGovernorate(governorate));
        }
        actions.push(WizardAction::SetStep(i64::from(Step::LAST.number())));

        actions.into_iter().fold(WizardState::default(), reduce)
    }
}

fn page_url(explicit: Option<String>, headers: &HeaderMap) -> String {
    explicit
        .filter(|u| !u.trim().is_empty())
        .or_else(|| referer(headers))
        .unwrap_or_default()
}

fn map_submission_error(request_id: String, error: SubmissionError) -> ApiError {
    match error {
        SubmissionError::Validation(msg) => ApiError::new(request_id, "validation_error", msg),
        SubmissionError::Persistence(e) => map_store_error(request_id, &e),
    }
}

pub(super) async fn create_lead(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<LeadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| {
        ApiError::new(req_id.0.clone(), "bad_request", format!("invalid JSON body: {e}"))
    })?;

    // The reducer silently ignores picks past the cap; an API caller should
    // hear about it instead.
    if body.selected_design_ids.len() > MAX_DESIGNS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("at most {MAX_DESIGNS} designs can be selected"),
        ));
    }

    let url = page_url(body.page_url.clone(), &headers);
    let wizard = body.into_state();
    let id = state
        .submitter
        .submit(&wizard, &url)
        .await
        .map_err(|e| map_submission_error(req_id.0.clone(), e))?;

    tracing::info!(request_id = %req_id.0, lead_id = %id, "cost calculator lead created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(req_id.0, CreatedLead { id })),
    ))
}

pub(super) async fn create_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| {
        ApiError::new(req_id.0.clone(), "bad_request", format!("invalid JSON body: {e}"))
    })?;

    let url = page_url(body.page_url, &headers);
    let id = state
        .submitter
        .submit_contact(body.form, &url)
        .await
        .map_err(|e| map_submission_error(req_id.0.clone(), e))?;

    tracing::info!(request_id = %req_id.0, lead_id = %id, "contact request created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(req_id.0, CreatedLead { id })),
    ))
}
