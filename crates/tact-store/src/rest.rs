//! [`LeadStore`] and [`ReferenceStore`] over a PostgREST-style HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tact_core::{Category, LeadFields, LeadId, StoreConfig};

use crate::types::{id_text, CatalogImage, Governorate};
use crate::{LeadStore, ReferenceStore, StoreError};

const LEADS_TABLE: &str = "contact_requests";
const CATALOG_TABLE: &str = "quiz_selection_images";
const GOVERNORATES_TABLE: &str = "governorates";

pub struct RestStore {
    client: Client,
    rest_url: Url,
    api_key: String,
}

impl RestStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`StoreError::Configuration`] if `base_url` does not
    /// parse.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tact/0.1 (store)")
            .build()?;

        // Accept either the project root or the `/rest/v1` endpoint itself.
        let trimmed = config.base_url.trim_end_matches('/');
        let root = trimmed.strip_suffix("/rest/v1").unwrap_or(trimmed);
        let rest_url = Url::parse(&format!("{root}/rest/v1/")).map_err(|e| {
            StoreError::Configuration(format!("invalid store URL '{}': {e}", config.base_url))
        })?;

        Ok(Self {
            client,
            rest_url,
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Url {
        let mut url = self.rest_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(table);
        }
        url
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send_json<T: DeserializeOwned>(
        builder: RequestBuilder,
        context: &str,
    ) -> Result<T, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl LeadStore for RestStore {
    async fn insert_lead(&self, fields: &LeadFields) -> Result<LeadId, StoreError> {
        let request = self
            .authed(self.client.post(self.table_url(LEADS_TABLE)))
            .header("Prefer", "return=representation")
            .json(&[fields]);
        let rows: Vec<Value> = Self::send_json(request, "insert contact_requests").await?;

        let id = rows
            .first()
            .and_then(|row| row.get("id"))
            .and_then(id_text)
            .ok_or(StoreError::Empty("insert contact_requests"))?;

        tracing::info!(lead_id = %id, source = ?fields.source, "lead persisted");
        Ok(LeadId(id))
    }

    async fn update_lead(&self, id: &LeadId, patch: Value) -> Result<(), StoreError> {
        let response = self
            .authed(self.client.patch(self.table_url(LEADS_TABLE)))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        tracing::debug!(lead_id = %id, "lead updated");
        Ok(())
    }
}

#[async_trait]
impl ReferenceStore for RestStore {
    async fn list_active(&self, category: Category) -> Result<Vec<CatalogImage>, StoreError> {
        let category_filter = format!("eq.{category}");
        let request = self
            .authed(self.client.get(self.table_url(CATALOG_TABLE)))
            .query(&[
                ("select", "id,title,image_url,display_order"),
                ("category", category_filter.as_str()),
                ("is_active", "eq.true"),
                ("order", "display_order"),
            ]);
        Self::send_json(request, "list quiz_selection_images").await
    }

    async fn list_governorates(&self) -> Result<Vec<Governorate>, StoreError> {
        let request = self
            .authed(self.client.get(self.table_url(GOVERNORATES_TABLE)))
            .query(&[("select", "id,name_ar"), ("order", "display_order")]);
        Self::send_json(request, "list governorates").await
    }
}
