//! Lead submission: validate, persist, then report the conversion on every
//! channel without making the caller wait for it.

use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tact_core::{validate_local_phone, ContactForm, LeadFields, LeadId, WizardError, WizardState};
use tact_meta::{ConversionEventSink, RawConversionEvent, SinkError};
use tact_store::{LeadStore, StoreError};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::events::{contact_event, lead_event};

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Input the visitor has to fix; nothing was stored.
    #[error("{0}")]
    Validation(String),

    #[error("could not save lead: {0}")]
    Persistence(#[from] StoreError),
}

impl From<WizardError> for SubmissionError {
    fn from(err: WizardError) -> Self {
        Self::Validation(err.to_string())
    }
}

pub struct LeadSubmitter {
    leads: Arc<dyn LeadStore>,
    sinks: Vec<Arc<dyn ConversionEventSink>>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl LeadSubmitter {
    #[must_use]
    pub fn new(leads: Arc<dyn LeadStore>) -> Self {
        Self {
            leads,
            sinks: Vec::new(),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ConversionEventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use]
    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Stores a finished cost-calculator wizard and fires a `Lead` event.
    ///
    /// Returns as soon as the lead is persisted. Conversion reporting runs in
    /// a detached task and its failures are only logged.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::Validation`] if a wizard step is incomplete, the
    ///   wizard was already submitted, or the phone is not a local mobile
    ///   number.
    /// - [`SubmissionError::Persistence`] if the store rejects the write.
    pub async fn submit(
        &self,
        state: &WizardState,
        page_url: &str,
    ) -> Result<LeadId, SubmissionError> {
        if state.is_submitted() {
            return Err(WizardError::AlreadySubmitted.into());
        }
        if let Some(err) = state.first_incomplete_step() {
            return Err(err.into());
        }
        if validate_local_phone(state.contact_phone()).is_none() {
            return Err(SubmissionError::Validation(
                "phone must be a local mobile number (07XXXXXXXXX)".to_owned(),
            ));
        }

        let fields = LeadFields::from_wizard(state);
        let lead_id = self.leads.insert_lead(&fields).await?;

        self.fan_out(lead_event(&fields, &lead_id, page_url));
        Ok(lead_id)
    }

    /// Stores a contact-form message and fires a `Contact` event.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::Validation`] if the name or phone is blank.
    /// - [`SubmissionError::Persistence`] if the store rejects the write.
    pub async fn submit_contact(
        &self,
        form: ContactForm,
        page_url: &str,
    ) -> Result<LeadId, SubmissionError> {
        if form.name.trim().is_empty() {
            return Err(SubmissionError::Validation("name is required".to_owned()));
        }
        if form.phone.trim().is_empty() {
            return Err(SubmissionError::Validation("phone is required".to_owned()));
        }

        let fields = LeadFields::from_contact(&form);
        let lead_id = self.leads.insert_lead(&fields).await?;

        self.fan_out(contact_event(&form, &lead_id, page_url));
        Ok(lead_id)
    }

    /// Waits for every conversion report started so far.
    ///
    /// Submissions never need this; short-lived processes and graceful
    /// shutdown call it so detached reports are not cut off.
    pub async fn flush(&self) {
        let pending = match self.in_flight.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for result in join_all(pending).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "conversion fan-out task panicked");
            }
        }
    }

    /// Sends `event` to every sink concurrently from a detached task.
    fn fan_out(&self, event: RawConversionEvent) {
        if self.sinks.is_empty() {
            return;
        }
        let sinks = self.sinks.clone();
        let handle = tokio::spawn(async move {
            let sends = sinks.iter().map(|sink| {
                let event = &event;
                async move { (sink.name(), sink.send(event).await) }
            });
            for (sink, result) in join_all(sends).await {
                match result {
                    Ok(()) => tracing::debug!(
                        sink,
                        event_name = %event.event_name,
                        external_id = ?event.external_id(),
                        "conversion event delivered"
                    ),
                    Err(SinkError::Unavailable(_)) => tracing::debug!(
                        sink,
                        event_name = %event.event_name,
                        "conversion channel unavailable, event skipped"
                    ),
                    Err(e) => tracing::warn!(
                        sink,
                        event_name = %event.event_name,
                        external_id = ?event.external_id(),
                        error = %e,
                        "conversion event failed"
                    ),
                }
            }
        });

        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.retain(|h| !h.is_finished());
            in_flight.push(handle);
        }
    }
}
