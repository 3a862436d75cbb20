//! Conversion event shapes: the raw event both channels start from, and the
//! hashed wire payload only the server channel sends.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event names the ad platform treats as standard events.
pub mod event_names {
    pub const LEAD: &str = "Lead";
    pub const CONTACT: &str = "Contact";
    pub const ADD_TO_CART: &str = "AddToCart";
    pub const VIEW_CONTENT: &str = "ViewContent";
    pub const INITIATE_CHECKOUT: &str = "InitiateCheckout";
    pub const PAGE_VIEW: &str = "PageView";
    pub const SEARCH: &str = "Search";

    pub const STANDARD: &[&str] = &[
        LEAD,
        CONTACT,
        ADD_TO_CART,
        VIEW_CONTENT,
        INITIATE_CHECKOUT,
        PAGE_VIEW,
        SEARCH,
    ];

    #[must_use]
    pub fn is_standard(name: &str) -> bool {
        STANDARD.contains(&name)
    }
}

/// Identity fields as the visitor typed them. Never sent off-box as-is by
/// the server channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Locality; the governorate for this site.
    pub city: Option<String>,
    pub country: Option<String>,
    /// Cross-channel correlation id (the persisted lead id).
    pub external_id: Option<String>,
}

impl UserData {
    #[must_use]
    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }

    #[must_use]
    pub fn has_city(&self) -> bool {
        self.city.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

/// A business event before any channel-specific preparation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConversionEvent {
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source_url: Option<String>,
    #[serde(default)]
    pub user_data: UserData,
    #[serde(default)]
    pub custom_data: Map<String, Value>,
}

impl RawConversionEvent {
    #[must_use]
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.event_source_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_user_data(mut self, user_data: UserData) -> Self {
        self.user_data = user_data;
        self
    }

    /// Adds one `custom_data` attribute. `None`-like values are skipped so
    /// optional attributes can be chained without branching.
    #[must_use]
    pub fn with_custom(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.custom_data.insert(key.to_string(), value);
        }
        self
    }

    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.user_data.external_id.as_deref()
    }
}

/// Hashed identity block in the Graph API's `user_data` format.
///
/// Every populated field is a single-element array of a SHA-256 hex digest.
/// Absent fields are omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HashedUserData {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ph: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub em: Vec<String>,
    #[serde(rename = "fn", skip_serializing_if = "Vec::is_empty")]
    pub first_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ln: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ct: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_id: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEvent {
    pub event_name: String,
    pub event_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_source_url: Option<String>,
    pub action_source: &'static str,
    pub user_data: HashedUserData,
    pub custom_data: Map<String, Value>,
}

/// Request body for `POST /{version}/{pixel_id}/events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionPayload {
    pub data: Vec<ServerEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_event_code: Option<String>,
}

/// What the API acknowledged for one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub events_received: Option<u64>,
    pub fbtrace_id: Option<String>,
    /// Full response body, passed back to HTTP callers unchanged.
    pub body: Value,
}

impl DispatchOutcome {
    pub(crate) fn from_body(body: Value) -> Self {
        Self {
            events_received: body.get("events_received").and_then(Value::as_u64),
            fbtrace_id: body
                .get("fbtrace_id")
                .and_then(Value::as_str)
                .map(str::to_owned),
            body,
        }
    }
}
