//! One capability, two channels: anything that can take a conversion event.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ConversionsClient;
use crate::error::SinkError;
use crate::pixel::PixelEmitter;
use crate::types::RawConversionEvent;

#[async_trait]
pub trait ConversionEventSink: Send + Sync {
    /// Short channel name for logs (`pixel`, `server`).
    fn name(&self) -> &'static str;

    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the channel could not take the event.
    /// Callers log it; it must never fail a lead submission.
    async fn send(&self, event: &RawConversionEvent) -> Result<(), SinkError>;
}

/// Browser pixel channel.
pub struct PixelSink {
    emitter: Arc<PixelEmitter>,
}

impl PixelSink {
    #[must_use]
    pub fn new(emitter: Arc<PixelEmitter>) -> Self {
        Self { emitter }
    }
}

#[async_trait]
impl ConversionEventSink for PixelSink {
    fn name(&self) -> &'static str {
        "pixel"
    }

    async fn send(&self, event: &RawConversionEvent) -> Result<(), SinkError> {
        if !self.emitter.is_ready() {
            return Err(SinkError::Unavailable("pixel"));
        }
        self.emitter.emit_event(event);
        Ok(())
    }
}

/// Server-to-server Conversions API channel.
pub struct ServerSink {
    client: Arc<ConversionsClient>,
}

impl ServerSink {
    #[must_use]
    pub fn new(client: Arc<ConversionsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConversionEventSink for ServerSink {
    fn name(&self) -> &'static str {
        "server"
    }

    async fn send(&self, event: &RawConversionEvent) -> Result<(), SinkError> {
        self.client.dispatch(event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tact_core::MetaConfig;

    use super::*;
    use crate::error::DispatchError;
    use crate::pixel::{PixelEvent, PixelTransport};

    #[derive(Default)]
    struct Capture(Mutex<Vec<PixelEvent>>);

    impl PixelTransport for Capture {
        fn load(&self, _pixel_id: &str) -> bool {
            true
        }

        fn fire(&self, event: PixelEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn pixel_sink_reports_unavailable_before_init() {
        let emitter = Arc::new(PixelEmitter::new(
            Some("px".into()),
            Arc::new(Capture::default()),
        ));
        let err = PixelSink::new(emitter)
            .send(&RawConversionEvent::new("Lead"))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Unavailable("pixel")));
    }

    #[tokio::test]
    async fn pixel_sink_forwards_once_ready() {
        let capture = Arc::new(Capture::default());
        let emitter = Arc::new(PixelEmitter::new(Some("px".into()), capture.clone()));
        emitter.init("/");
        PixelSink::new(emitter)
            .send(&RawConversionEvent::new("Lead"))
            .await
            .unwrap();
        let fired = capture.0.lock().unwrap();
        assert_eq!(fired.last().unwrap().event_name, "Lead");
    }

    #[tokio::test]
    async fn server_sink_maps_dispatch_errors() {
        let client = ConversionsClient::new(&MetaConfig::default()).unwrap();
        let sink = ServerSink::new(Arc::new(client));
        assert_eq!(sink.name(), "server");
        let err = sink
            .send(&RawConversionEvent::new("Lead"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SinkError::Dispatch(DispatchError::Configuration(_))
        ));
    }
}
