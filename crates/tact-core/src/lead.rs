//! Lead records and the contact-phone gate.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::quiz::{Dimensions, KitchenShape, Material};
use crate::wizard::WizardState;

/// Locality stored when the visitor never touches the governorate picker.
pub const DEFAULT_GOVERNORATE: &str = "بغداد";

static LOCAL_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^07[3-9]\d{8}$").expect("valid local phone regex"));

/// Identifier the data service assigns to a persisted lead. Also used as the
/// cross-channel `external_id` for conversion events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    CostCalculator,
    ContactForm,
}

/// Row written to the `contact_requests` collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadFields {
    pub phone: String,
    pub source: LeadSource,
    pub governorate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kitchen_type: Option<KitchenShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_designs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LeadFields {
    /// Snapshot of a finished wizard, with the phone already cleaned.
    #[must_use]
    pub fn from_wizard(state: &WizardState) -> Self {
        Self {
            phone: clean_phone(state.contact_phone()),
            source: LeadSource::CostCalculator,
            governorate: state.governorate().to_string(),
            kitchen_type: state.kitchen_shape(),
            dimensions: Some(*state.dimensions()),
            selected_designs: Some(state.selected_design_ids().to_vec()),
            material: state.material(),
            name: None,
            area: None,
            message: None,
        }
    }

    #[must_use]
    pub fn from_contact(form: &ContactForm) -> Self {
        Self {
            phone: clean_phone(&form.phone),
            source: LeadSource::ContactForm,
            governorate: form
                .governorate
                .clone()
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GOVERNORATE.to_string()),
            kitchen_type: None,
            dimensions: None,
            selected_designs: None,
            material: None,
            name: Some(form.name.trim().to_string()),
            area: form.area.clone().filter(|a| !a.trim().is_empty()),
            message: form.message.clone().filter(|m| !m.trim().is_empty()),
        }
    }
}

/// General "get in touch" form, separate from the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub governorate: Option<String>,
    #[serde(default, alias = "region")]
    pub area: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Removes all whitespace from a phone number as typed.
#[must_use]
pub fn clean_phone(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Checks a phone against the local mobile format `07[3-9]XXXXXXXX`, after
/// whitespace removal. Returns the cleaned number on success.
#[must_use]
pub fn validate_local_phone(raw: &str) -> Option<String> {
    let cleaned = clean_phone(raw);
    LOCAL_PHONE.is_match(&cleaned).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{reduce, WizardAction};

    #[test]
    fn accepts_spaced_local_number() {
        assert_eq!(
            validate_local_phone("0771 333 5020").as_deref(),
            Some("07713335020")
        );
    }

    #[test]
    fn rejects_operator_digit_outside_range() {
        assert_eq!(validate_local_phone("0711234567"), None);
        assert_eq!(validate_local_phone("07123456789"), None);
    }

    #[test]
    fn rejects_wrong_length_and_international_form() {
        assert_eq!(validate_local_phone("0771333502"), None);
        assert_eq!(validate_local_phone("077133350201"), None);
        assert_eq!(validate_local_phone("9647713335020"), None);
        assert_eq!(validate_local_phone(""), None);
    }

    #[test]
    fn lead_fields_capture_every_wizard_field() {
        let state = [
            WizardAction::SetShape(KitchenShape::U),
            WizardAction::SetWall {
                index: 1,
                meters: Some(2.0),
            },
            WizardAction::ToggleDesign("x".into()),
            WizardAction::SetMaterial(Material::Plywood),
            WizardAction::SetPhone("0781 000 0000".into()),
            WizardAction::SetGovernorate("البصرة".into()),
        ]
        .into_iter()
        .fold(WizardState::default(), reduce);

        let fields = LeadFields::from_wizard(&state);
        assert_eq!(fields.phone, "07810000000");
        assert_eq!(fields.source, LeadSource::CostCalculator);
        assert_eq!(fields.kitchen_type, Some(KitchenShape::U));
        assert_eq!(fields.material, Some(Material::Plywood));
        assert_eq!(fields.selected_designs.as_deref(), Some(&["x".to_string()][..]));
        assert_eq!(fields.governorate, "البصرة");

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["source"], "cost_calculator");
        assert_eq!(json["kitchen_type"], "U");
        assert_eq!(json["dimensions"]["wall1"], 2.0);
        assert!(json.get("name").is_none());
    }

    #[test]
    fn contact_fields_default_governorate_and_drop_blank_extras() {
        let form = ContactForm {
            name: " Ali Hassan ".into(),
            phone: "0770 123 4567".into(),
            governorate: None,
            area: Some("  ".into()),
            message: Some("hello".into()),
        };
        let fields = LeadFields::from_contact(&form);
        assert_eq!(fields.source, LeadSource::ContactForm);
        assert_eq!(fields.governorate, DEFAULT_GOVERNORATE);
        assert_eq!(fields.name.as_deref(), Some("Ali Hassan"));
        assert!(fields.area.is_none());
        assert_eq!(fields.message.as_deref(), Some("hello"));
        assert_eq!(fields.phone, "07701234567");
    }
}
