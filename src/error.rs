/// Why an inference call produced no usable response.
///
/// Callers treat every variant the same way; the variants exist so the
/// cause can be logged.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The request could not be sent or the reply could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered 404.
    #[error("endpoint not found at {url}; check the host, port and model name")]
    NotFound { url: String },

    /// The server answered with another non-2xx status.
    #[error("inference server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the expected JSON object.
    #[error("malformed response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}
