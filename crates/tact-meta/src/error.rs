use thiserror::Error;

/// Errors returned by the server-side Conversions API dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event itself is malformed (e.g. no event name).
    #[error("invalid conversion event: {0}")]
    Validation(String),

    /// Pixel id or access token is missing; no request was attempted.
    #[error("conversions API not configured: {0}")]
    Configuration(String),

    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("conversions API returned HTTP {status}: {body}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    /// A 2xx response body could not be parsed.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by one [`crate::ConversionEventSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The channel is not loaded; the event was skipped.
    #[error("{0} channel unavailable")]
    Unavailable(&'static str),
}
