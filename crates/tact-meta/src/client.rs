//! Server-to-server client for the Meta Conversions API.
//!
//! Hashes identity fields, wraps the event in the Graph API envelope, and
//! posts it to `{base}/{version}/{pixel_id}/events`. The access token never
//! leaves this module except as the `access_token` query parameter of that
//! request; errors are stripped of their URL before they are returned.

use std::time::Duration;

use reqwest::{Client, Url};
use tact_core::MetaConfig;

use crate::error::DispatchError;
use crate::normalize::hash_user_data;
use crate::retry::retry_with_backoff;
use crate::types::{ConversionPayload, DispatchOutcome, RawConversionEvent, ServerEvent};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/";
const DEFAULT_API_VERSION: &str = "v18.0";
const ACTION_SOURCE_WEBSITE: &str = "website";
const RETRY_BACKOFF_BASE_MS: u64 = 500;

/// Client for the Conversions API.
///
/// Construction never fails on missing credentials: an unconfigured client
/// is valid and answers every [`ConversionsClient::dispatch`] with
/// [`DispatchError::Configuration`] without touching the network.
pub struct ConversionsClient {
    client: Client,
    base_url: Url,
    pixel_id: Option<String>,
    access_token: Option<String>,
    test_event_code: Option<String>,
    api_version: String,
    max_retries: u32,
}

impl ConversionsClient {
    /// Creates a client pointed at the production Graph API.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &MetaConfig) -> Result<Self, DispatchError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`DispatchError::Configuration`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(config: &MetaConfig, base_url: &str) -> Result<Self, DispatchError> {
        let timeout_secs = if config.request_timeout_secs == 0 {
            10
        } else {
            config.request_timeout_secs
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("tact/0.1 (conversions)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            DispatchError::Configuration(format!("invalid base URL '{base_url}': {e}"))
        })?;

        let api_version = if config.api_version.trim().is_empty() {
            DEFAULT_API_VERSION.to_owned()
        } else {
            config.api_version.trim().to_owned()
        };

        Ok(Self {
            client,
            base_url,
            pixel_id: non_blank(config.pixel_id.as_deref()),
            access_token: non_blank(config.access_token.as_deref()),
            test_event_code: non_blank(config.test_event_code.as_deref()),
            api_version,
            max_retries: config.max_retries,
        })
    }

    /// Whether both the pixel id and the access token are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.pixel_id.is_some() && self.access_token.is_some()
    }

    /// Builds the wire payload for one event: hashed identity, `website`
    /// action source, and the test code when one is configured.
    #[must_use]
    pub fn build_payload(&self, event: &RawConversionEvent, event_time: i64) -> ConversionPayload {
        ConversionPayload {
            data: vec![ServerEvent {
                event_name: event.event_name.trim().to_owned(),
                event_time,
                event_source_url: event.event_source_url.clone(),
                action_source: ACTION_SOURCE_WEBSITE,
                user_data: hash_user_data(&event.user_data),
                custom_data: event.custom_data.clone(),
            }],
            test_event_code: self.test_event_code.clone(),
        }
    }

    /// Sends one event and returns what the API acknowledged.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Configuration`] if the token or pixel id is missing.
    ///   Checked before anything else; no request is made.
    /// - [`DispatchError::Validation`] if `event_name` is blank.
    /// - [`DispatchError::Http`] on network failure or timeout.
    /// - [`DispatchError::Upstream`] on a non-2xx answer.
    /// - [`DispatchError::Deserialize`] if a 2xx body is not JSON.
    pub async fn dispatch(
        &self,
        event: &RawConversionEvent,
    ) -> Result<DispatchOutcome, DispatchError> {
        let (Some(pixel_id), Some(token)) = (&self.pixel_id, &self.access_token) else {
            return Err(DispatchError::Configuration(
                "META_PIXEL_ID and META_ACCESS_TOKEN must both be set".to_owned(),
            ));
        };
        if event.event_name.trim().is_empty() {
            return Err(DispatchError::Validation("event name is required".to_owned()));
        }

        let payload = self.build_payload(event, chrono::Utc::now().timestamp());
        let url = self.events_url(pixel_id)?;
        let (url, payload) = (&url, &payload);

        let outcome = retry_with_backoff(self.max_retries, RETRY_BACKOFF_BASE_MS, move || {
            self.post_events(url, token, payload)
        })
        .await?;

        tracing::info!(
            event_name = %event.event_name,
            events_received = ?outcome.events_received,
            fbtrace_id = ?outcome.fbtrace_id,
            "conversion event dispatched"
        );
        Ok(outcome)
    }

    fn events_url(&self, pixel_id: &str) -> Result<Url, DispatchError> {
        self.base_url
            .join(&format!("{}/{pixel_id}/events", self.api_version))
            .map_err(|e| DispatchError::Configuration(format!("invalid events URL: {e}")))
    }

    async fn post_events(
        &self,
        url: &Url,
        token: &str,
        payload: &ConversionPayload,
    ) -> Result<DispatchOutcome, DispatchError> {
        let response = self
            .client
            .post(url.clone())
            .query(&[("access_token", token)])
            .json(payload)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let text = response.text().await.map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            let body = serde_json::from_str(&text)
                .unwrap_or_else(|_| serde_json::Value::String(text.clone()));
            tracing::warn!(status = status.as_u16(), "conversions API rejected event");
            return Err(DispatchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = serde_json::from_str(&text).map_err(|e| DispatchError::Deserialize {
            context: format!("{}/events response", self.api_version),
            source: e,
        })?;
        Ok(DispatchOutcome::from_body(body))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
