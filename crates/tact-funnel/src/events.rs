//! Conversion events the funnel emits once a lead is on disk.

use tact_core::{ContactForm, LeadFields, LeadId};
use tact_meta::{event_names, split_full_name, RawConversionEvent, UserData};

pub const CALCULATOR_CONTENT_NAME: &str = "Kitchen Cost Calculator";
pub const CALCULATOR_CONTENT_CATEGORY: &str = "cost_calculator";
pub const CONTACT_CONTENT_NAME: &str = "Contact Form";
pub const CONTACT_CONTENT_CATEGORY: &str = "contact";
const COUNTRY: &str = "iq";
const CURRENCY: &str = "IQD";

/// `Lead` event for a finished cost-calculator wizard.
#[must_use]
pub fn lead_event(fields: &LeadFields, lead_id: &LeadId, page_url: &str) -> RawConversionEvent {
    RawConversionEvent::new(event_names::LEAD)
        .with_source_url(page_url)
        .with_user_data(UserData {
            phone: Some(fields.phone.clone()),
            city: Some(fields.governorate.clone()),
            country: Some(COUNTRY.to_owned()),
            external_id: Some(lead_id.to_string()),
            ..UserData::default()
        })
        .with_custom("content_name", CALCULATOR_CONTENT_NAME)
        .with_custom("content_category", CALCULATOR_CONTENT_CATEGORY)
        .with_custom("kitchen_type", fields.kitchen_type.map(|k| k.as_str()))
        .with_custom("material", fields.material.map(|m| m.as_str()))
        .with_custom("currency", CURRENCY)
}

/// `Contact` event for the general contact form.
#[must_use]
pub fn contact_event(form: &ContactForm, lead_id: &LeadId, page_url: &str) -> RawConversionEvent {
    let (first_name, last_name) = split_full_name(&form.name);
    let city = form
        .governorate
        .clone()
        .filter(|g| !g.trim().is_empty());
    RawConversionEvent::new(event_names::CONTACT)
        .with_source_url(page_url)
        .with_user_data(UserData {
            phone: Some(form.phone.clone()),
            first_name,
            last_name,
            city,
            country: Some(COUNTRY.to_owned()),
            external_id: Some(lead_id.to_string()),
            ..UserData::default()
        })
        .with_custom("content_name", CONTACT_CONTENT_NAME)
        .with_custom("content_category", CONTACT_CONTENT_CATEGORY)
}

#[cfg(test)]
mod tests {
    use tact_core::{reduce, KitchenShape, Material, WizardAction, WizardState};

    use super::*;

    #[test]
    fn lead_event_carries_calculator_attributes() {
        let state = [
            WizardAction::SetShape(KitchenShape::L),
            WizardAction::SetMaterial(Material::Acrylic),
            WizardAction::SetPhone("0770 123 4567".into()),
        ]
        .into_iter()
        .fold(WizardState::default(), reduce);
        let fields = LeadFields::from_wizard(&state);

        let event = lead_event(&fields, &LeadId("7".into()), "https://tact.example/cost-calculator");

        assert_eq!(event.event_name, "Lead");
        assert_eq!(event.external_id(), Some("7"));
        assert_eq!(event.user_data.phone.as_deref(), Some("07701234567"));
        assert_eq!(event.user_data.city.as_deref(), Some("بغداد"));
        assert_eq!(event.user_data.country.as_deref(), Some("iq"));
        assert_eq!(event.custom_data["kitchen_type"], "L");
        assert_eq!(event.custom_data["material"], "acrylic");
        assert_eq!(event.custom_data["currency"], "IQD");
        assert_eq!(event.custom_data["content_category"], "cost_calculator");
    }

    #[test]
    fn contact_event_splits_name() {
        let form = ContactForm {
            name: "Zainab Ali Kareem".into(),
            phone: "07811112222".into(),
            governorate: Some("أربيل".into()),
            ..ContactForm::default()
        };
        let event = contact_event(&form, &LeadId("c-1".into()), "https://tact.example/contact");

        assert_eq!(event.event_name, "Contact");
        assert_eq!(event.user_data.first_name.as_deref(), Some("Zainab"));
        assert_eq!(event.user_data.last_name.as_deref(), Some("Ali Kareem"));
        assert_eq!(event.user_data.city.as_deref(), Some("أربيل"));
        assert_eq!(event.custom_data["content_name"], "Contact Form");
        assert!(!event.custom_data.contains_key("currency"));
    }
}
