//! Persistence collaborators for the funnel: the lead sink and the
//! read-only reference data (catalog images, governorates).
//!
//! The traits are the contract the rest of the workspace depends on;
//! [`RestStore`] is the shipped implementation against a hosted
//! PostgREST-style data service.

use async_trait::async_trait;
use tact_core::{Category, LeadFields, LeadId};
use thiserror::Error;

pub mod rest;
pub mod types;

pub use rest::RestStore;
pub use types::{CatalogImage, Governorate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("data service returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store misconfigured: {0}")]
    Configuration(String),

    /// An insert answered 2xx but returned no row.
    #[error("{0} returned no rows")]
    Empty(&'static str),
}

/// Where submitted leads are written.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Inserts one lead and returns the id the service assigned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails or returns no row.
    async fn insert_lead(&self, fields: &LeadFields) -> Result<LeadId, StoreError>;

    /// Applies a partial update to an existing lead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update is rejected.
    async fn update_lead(&self, id: &LeadId, patch: serde_json::Value) -> Result<(), StoreError>;
}

/// Read-only lookups that populate the wizard's choices.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Active catalog entries for `category`, in display order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn list_active(&self, category: Category) -> Result<Vec<CatalogImage>, StoreError>;

    /// Governorates in display order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn list_governorates(&self) -> Result<Vec<Governorate>, StoreError>;
}
