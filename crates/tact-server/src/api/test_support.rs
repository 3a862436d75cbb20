//! In-memory collaborators for router tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use tact_core::{Category, LeadFields, LeadId, MetaConfig};
use tact_funnel::LeadSubmitter;
use tact_meta::{ConversionsClient, ServerSink};
use tact_store::{CatalogImage, Governorate, LeadStore, ReferenceStore, StoreError};

use super::{build_app, default_rate_limit_state, AppState};

#[derive(Default)]
pub(crate) struct MemoryLeads {
    pub inserted: Mutex<Vec<LeadFields>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl LeadStore for MemoryLeads {
    async fn insert_lead(&self, fields: &LeadFields) -> Result<LeadId, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Upstream {
                status: 503,
                body: "down".into(),
            });
        }
        let mut rows = self.inserted.lock().unwrap();
        rows.push(fields.clone());
        Ok(LeadId(format!("lead-{}", rows.len())))
    }

    async fn update_lead(&self, _id: &LeadId, _patch: serde_json::Value) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct StaticReference {
    pub fail: AtomicBool,
}

#[async_trait]
impl ReferenceStore for StaticReference {
    async fn list_active(&self, category: Category) -> Result<Vec<CatalogImage>, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Empty("list"));
        }
        Ok(vec![CatalogImage {
            id: format!("{category}-1"),
            title: Some(format!("First {category}")),
            image_url: format!("https://cdn.example/{category}-1.webp"),
            display_order: 1,
        }])
    }

    async fn list_governorates(&self) -> Result<Vec<Governorate>, StoreError> {
        Ok(vec![
            Governorate {
                id: "1".into(),
                name_ar: "بغداد".into(),
            },
            Governorate {
                id: "2".into(),
                name_ar: "البصرة".into(),
            },
        ])
    }
}

pub(crate) struct Fakes {
    pub leads: Arc<MemoryLeads>,
    pub reference: Arc<StaticReference>,
}

pub(crate) fn unconfigured_conversions() -> ConversionsClient {
    ConversionsClient::new(&MetaConfig::default()).expect("client")
}

pub(crate) fn conversions_at(base_url: &str) -> ConversionsClient {
    let config = MetaConfig {
        pixel_id: Some("px-1".into()),
        access_token: Some("test-token".into()),
        test_event_code: None,
        api_version: "v18.0".into(),
        request_timeout_secs: 5,
        max_retries: 0,
    };
    ConversionsClient::with_base_url(&config, base_url).expect("client")
}

pub(crate) fn app(conversions: ConversionsClient) -> (Router, Fakes) {
    let leads = Arc::new(MemoryLeads::default());
    let reference = Arc::new(StaticReference::default());
    let conversions = Arc::new(conversions);
    let submitter = LeadSubmitter::new(leads.clone())
        .with_sink(Arc::new(ServerSink::new(Arc::clone(&conversions))));

    let state = AppState {
        submitter: Arc::new(submitter),
        conversions,
        reference: reference.clone(),
    };
    (
        build_app(state, default_rate_limit_state()),
        Fakes { leads, reference },
    )
}
