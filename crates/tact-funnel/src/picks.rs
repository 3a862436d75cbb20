//! Mid-wizard pixel signals.

use tact_core::{reduce, WizardAction, WizardState, MAX_DESIGNS};
use tact_meta::{ContentAttributes, PixelEmitter};

const FALLBACK_DESIGN_NAME: &str = "Kitchen Design";

/// Toggles design `id` and fires `AddToCart` when the toggle adds it.
///
/// Removing a design, or picking past the cap, emits nothing. The pixel is
/// best-effort, so the state transition never depends on it.
#[must_use]
pub fn pick_design(
    state: WizardState,
    id: &str,
    title: Option<&str>,
    pixel: &PixelEmitter,
) -> WizardState {
    let selected = state.selected_design_ids();
    let adds = !state.is_submitted()
        && !selected.iter().any(|d| d == id)
        && selected.len() < MAX_DESIGNS;

    if adds {
        pixel.track_add_to_cart(ContentAttributes {
            content_ids: vec![id.to_owned()],
            content_type: Some("product".to_owned()),
            ..ContentAttributes::named(title.unwrap_or(FALLBACK_DESIGN_NAME))
        });
    }
    reduce(state, WizardAction::ToggleDesign(id.to_owned()))
}
