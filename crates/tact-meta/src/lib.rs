//! Conversion tracking for the lead funnel.
//!
//! Two channels report the same business event:
//!
//! - [`ConversionsClient`] posts hashed events server-to-server from the
//!   trusted boundary and holds the access token.
//! - [`PixelEmitter`] fires the un-hashed, best-effort browser-side pixel.
//!
//! Both are wrapped as [`ConversionEventSink`]s so callers can fan an event
//! out to every channel without caring which is which.

pub mod client;
pub mod error;
pub mod normalize;
pub mod pixel;
pub(crate) mod retry;
pub mod sink;
pub mod types;

pub use client::ConversionsClient;
pub use error::{DispatchError, SinkError};
pub use normalize::{hash_identity, hash_user_data, normalize_phone, split_full_name};
pub use pixel::{BeaconTransport, ContentAttributes, PixelEmitter, PixelEvent, PixelTransport};
pub use sink::{ConversionEventSink, PixelSink, ServerSink};
pub use types::{
    event_names, ConversionPayload, DispatchOutcome, HashedUserData, RawConversionEvent,
    ServerEvent, UserData,
};
