//! Browser-side pixel channel.
//!
//! The emitter is best-effort: it never returns an error and silently drops
//! events until the pixel has loaded. Identity fields travel un-hashed and no
//! access token is involved; hashing is the server channel's job.

use std::sync::{Arc, OnceLock};

use reqwest::{Client, Url};
use serde_json::{Map, Value};

use crate::types::{event_names, RawConversionEvent, UserData};

const BEACON_ENDPOINT: &str = "https://www.facebook.com/tr";
const DEFAULT_CURRENCY: &str = "IQD";

/// One call to the pixel, as `fbq(method, event_name, custom_data)` would
/// receive it.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelEvent {
    pub pixel_id: String,
    pub event_name: String,
    pub custom_data: Map<String, Value>,
    pub user_data: UserData,
    pub source_url: Option<String>,
}

impl PixelEvent {
    /// `track` for standard event names, `trackCustom` for everything else.
    #[must_use]
    pub fn method(&self) -> &'static str {
        if event_names::is_standard(&self.event_name) {
            "track"
        } else {
            "trackCustom"
        }
    }
}

/// Seam between the emitter and whatever actually talks to the pixel.
pub trait PixelTransport: Send + Sync {
    /// Loads the pixel for `pixel_id`. Returns `false` if it is unusable.
    fn load(&self, pixel_id: &str) -> bool;

    /// Hands one event to the pixel without waiting for it.
    fn fire(&self, event: PixelEvent);
}

/// Sends events to the pixel's image-beacon endpoint from a detached task.
pub struct BeaconTransport {
    client: Client,
    endpoint: Url,
}

impl BeaconTransport {
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .user_agent("tact/0.1 (pixel)")
            .build()?;
        let endpoint = Url::parse(BEACON_ENDPOINT).expect("valid beacon endpoint");
        Ok(Self { client, endpoint })
    }

    /// Builds the beacon URL: `id`, `ev`, `dl`, then `cd[..]` and `ud[..]`
    /// pairs for every populated attribute.
    #[must_use]
    pub fn beacon_url(&self, event: &PixelEvent) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("id", &event.pixel_id);
            pairs.append_pair("ev", &event.event_name);
            if let Some(dl) = &event.source_url {
                pairs.append_pair("dl", dl);
            }
            for (key, value) in &event.custom_data {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                pairs.append_pair(&format!("cd[{key}]"), &rendered);
            }
            let user = &event.user_data;
            for (key, value) in [
                ("ph", &user.phone),
                ("em", &user.email),
                ("fn", &user.first_name),
                ("ln", &user.last_name),
                ("ct", &user.city),
                ("country", &user.country),
                ("external_id", &user.external_id),
            ] {
                if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                    pairs.append_pair(&format!("ud[{key}]"), v);
                }
            }
        }
        url
    }
}

impl PixelTransport for BeaconTransport {
    fn load(&self, pixel_id: &str) -> bool {
        tracing::debug!(pixel_id, "pixel beacon ready");
        true
    }

    fn fire(&self, event: PixelEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(event_name = %event.event_name, "no runtime, pixel event skipped");
            return;
        };
        let url = self.beacon_url(&event);
        let client = self.client.clone();
        let method = event.method();
        let event_name = event.event_name;
        handle.spawn(async move {
            match client.get(url).send().await {
                Ok(resp) => {
                    tracing::debug!(%event_name, method, status = resp.status().as_u16(), "pixel event sent");
                }
                Err(e) => {
                    tracing::debug!(%event_name, error = %e.without_url(), "pixel event failed");
                }
            }
        });
    }
}

/// Attributes for the typed commerce helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentAttributes {
    pub content_name: Option<String>,
    pub content_category: Option<String>,
    pub content_ids: Vec<String>,
    pub content_type: Option<String>,
    pub value: Option<f64>,
    pub currency: Option<String>,
}

impl ContentAttributes {
    #[must_use]
    pub fn named(content_name: impl Into<String>) -> Self {
        Self {
            content_name: Some(content_name.into()),
            ..Self::default()
        }
    }

    /// Fills in `currency = IQD` and `value = 0` where unset.
    fn into_commerce_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(name) = self.content_name {
            map.insert("content_name".into(), name.into());
        }
        if let Some(category) = self.content_category {
            map.insert("content_category".into(), category.into());
        }
        if !self.content_ids.is_empty() {
            map.insert("content_ids".into(), self.content_ids.into());
        }
        if let Some(content_type) = self.content_type {
            map.insert("content_type".into(), content_type.into());
        }
        map.insert("value".into(), self.value.unwrap_or(0.0).into());
        map.insert(
            "currency".into(),
            self.currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned())
                .into(),
        );
        map
    }
}

/// Fire-and-forget emitter for the browser pixel.
///
/// Build one per process and share it behind an `Arc`; the loader runs at
/// most once per emitter.
pub struct PixelEmitter {
    pixel_id: Option<String>,
    transport: Arc<dyn PixelTransport>,
    ready: OnceLock<bool>,
}

impl PixelEmitter {
    #[must_use]
    pub fn new(pixel_id: Option<String>, transport: Arc<dyn PixelTransport>) -> Self {
        Self {
            pixel_id: pixel_id.filter(|id| !id.trim().is_empty()),
            transport,
            ready: OnceLock::new(),
        }
    }

    /// Runs the loader once. Later calls return the first outcome.
    ///
    /// Without a pixel id the emitter stays unavailable for its whole life.
    pub fn load(&self) -> bool {
        *self.ready.get_or_init(|| match &self.pixel_id {
            Some(id) => {
                let ok = self.transport.load(id);
                if !ok {
                    tracing::warn!("pixel failed to load; browser events disabled");
                }
                ok
            }
            None => {
                tracing::debug!("pixel id not configured; browser events disabled");
                false
            }
        })
    }

    /// Loads the pixel on first call, then records a view of `path`. Later
    /// calls only record the page view.
    pub fn init(&self, path: &str) {
        if self.load() {
            self.page_view(path);
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.get().copied().unwrap_or(false)
    }

    /// Records a client-side navigation.
    pub fn page_view(&self, path: &str) {
        self.emit_with(
            event_names::PAGE_VIEW,
            Map::new(),
            UserData::default(),
            Some(path.to_owned()),
        );
    }

    /// Fires `event_name` with `attributes`. A no-op until [`Self::init`]
    /// has loaded the pixel.
    pub fn emit(&self, event_name: &str, attributes: Map<String, Value>) {
        self.emit_with(event_name, attributes, UserData::default(), None);
    }

    /// Fires a full conversion event, identity fields included as typed.
    pub fn emit_event(&self, event: &RawConversionEvent) {
        self.emit_with(
            &event.event_name,
            event.custom_data.clone(),
            event.user_data.clone(),
            event.event_source_url.clone(),
        );
    }

    pub fn track_add_to_cart(&self, attributes: ContentAttributes) {
        self.emit(event_names::ADD_TO_CART, attributes.into_commerce_map());
    }

    fn emit_with(
        &self,
        event_name: &str,
        custom_data: Map<String, Value>,
        user_data: UserData,
        source_url: Option<String>,
    ) {
        if !self.is_ready() {
            tracing::debug!(event_name, "emitter unavailable, pixel event dropped");
            return;
        }
        self.fire(event_name, custom_data, user_data, source_url);
    }

    fn fire(
        &self,
        event_name: &str,
        custom_data: Map<String, Value>,
        user_data: UserData,
        source_url: Option<String>,
    ) {
        let Some(pixel_id) = &self.pixel_id else {
            return;
        };
        self.transport.fire(PixelEvent {
            pixel_id: pixel_id.clone(),
            event_name: event_name.to_owned(),
            custom_data,
            user_data,
            source_url,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        loads: AtomicU32,
        fail_load: bool,
        fired: Mutex<Vec<PixelEvent>>,
    }

    impl RecordingTransport {
        fn fired(&self) -> Vec<PixelEvent> {
            self.fired.lock().unwrap().clone()
        }
    }

    impl PixelTransport for RecordingTransport {
        fn load(&self, _pixel_id: &str) -> bool {
            self.loads.fetch_add(1, Ordering::SeqCst);
            !self.fail_load
        }

        fn fire(&self, event: PixelEvent) {
            self.fired.lock().unwrap().push(event);
        }
    }

    fn emitter(pixel_id: Option<&str>) -> (PixelEmitter, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let emitter = PixelEmitter::new(pixel_id.map(str::to_owned), transport.clone());
        (emitter, transport)
    }

    #[test]
    fn emit_before_init_is_a_no_op() {
        let (emitter, transport) = emitter(Some("px-1"));
        emitter.emit("Lead", Map::new());
        assert!(!emitter.is_ready());
        assert!(transport.fired().is_empty());
    }

    #[test]
    fn init_loads_once_and_fires_page_view_each_call() {
        let (emitter, transport) = emitter(Some("px-1"));
        emitter.init("/");
        emitter.init("/cost-calculator");
        assert_eq!(transport.loads.load(Ordering::SeqCst), 1);
        let fired = transport.fired();
        assert_eq!(fired.len(), 2);
        assert!(fired.iter().all(|e| e.event_name == "PageView"));
        assert_eq!(fired[1].source_url.as_deref(), Some("/cost-calculator"));
    }

    #[test]
    fn load_alone_fires_nothing() {
        let (emitter, transport) = emitter(Some("px-1"));
        assert!(emitter.load());
        assert!(emitter.load());
        assert!(emitter.is_ready());
        assert_eq!(transport.loads.load(Ordering::SeqCst), 1);
        assert!(transport.fired().is_empty());
    }

    #[test]
    fn missing_pixel_id_never_loads() {
        let (emitter, transport) = emitter(None);
        emitter.init("/");
        emitter.emit("Lead", Map::new());
        assert_eq!(transport.loads.load(Ordering::SeqCst), 0);
        assert!(transport.fired().is_empty());
    }

    #[test]
    fn failed_load_leaves_emitter_unavailable() {
        let transport = Arc::new(RecordingTransport {
            fail_load: true,
            ..RecordingTransport::default()
        });
        let emitter = PixelEmitter::new(Some("px-1".into()), transport.clone());
        emitter.init("/");
        emitter.emit("Lead", Map::new());
        assert!(!emitter.is_ready());
        assert!(transport.fired().is_empty());
    }

    #[test]
    fn commerce_helpers_default_currency_and_value() {
        let (emitter, transport) = emitter(Some("px-1"));
        emitter.init("/");
        emitter.track_add_to_cart(ContentAttributes {
            content_ids: vec!["d-7".into()],
            content_type: Some("product".into()),
            ..ContentAttributes::named("Modern Oak")
        });
        let event = transport.fired().pop().unwrap();
        assert_eq!(event.event_name, "AddToCart");
        assert_eq!(event.method(), "track");
        assert_eq!(event.custom_data["currency"], "IQD");
        assert_eq!(event.custom_data["value"], 0.0);
        assert_eq!(event.custom_data["content_ids"], serde_json::json!(["d-7"]));
        assert_eq!(event.custom_data["content_type"], "product");
    }

    #[test]
    fn non_standard_event_uses_track_custom() {
        let (emitter, transport) = emitter(Some("px-1"));
        emitter.init("/");
        emitter.emit("QuizStarted", Map::new());
        assert_eq!(transport.fired().pop().unwrap().method(), "trackCustom");
    }

    #[test]
    fn emit_event_passes_identity_un_hashed() {
        let (emitter, transport) = emitter(Some("px-1"));
        emitter.init("/");
        let event = RawConversionEvent::new("Lead").with_user_data(UserData {
            phone: Some("07701234567".into()),
            ..UserData::default()
        });
        emitter.emit_event(&event);
        let fired = transport.fired().pop().unwrap();
        assert_eq!(fired.user_data.phone.as_deref(), Some("07701234567"));
    }

    #[test]
    fn beacon_url_carries_event_and_attributes() {
        let transport = BeaconTransport::new().unwrap();
        let mut custom = Map::new();
        custom.insert("currency".into(), "IQD".into());
        custom.insert("value".into(), 0.into());
        let url = transport.beacon_url(&PixelEvent {
            pixel_id: "px-1".into(),
            event_name: "Lead".into(),
            custom_data: custom,
            user_data: UserData {
                city: Some("Basra".into()),
                ..UserData::default()
            },
            source_url: None,
        });
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/tr");
        assert!(pairs.contains(&("id".into(), "px-1".into())));
        assert!(pairs.contains(&("ev".into(), "Lead".into())));
        assert!(pairs.contains(&("cd[currency]".into(), "IQD".into())));
        assert!(pairs.contains(&("cd[value]".into(), "0".into())));
        assert!(pairs.contains(&("ud[ct]".into(), "Basra".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "ud[ph]"));
    }

    #[test]
    fn beacon_fire_without_runtime_is_skipped() {
        let transport = BeaconTransport::new().unwrap();
        transport.fire(PixelEvent {
            pixel_id: "px-1".into(),
            event_name: "PageView".into(),
            custom_data: Map::new(),
            user_data: UserData::default(),
            source_url: None,
        });
    }
}
