use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

impl<'a> InferenceRequest<'a> {
    /// Builds a non-streaming request.
    pub fn new(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            prompt,
            stream: false,
        }
    }
}

/// Reply of `POST /api/generate`.
///
/// Only `response` is consumed. Every other field the server sends is kept
/// as-is in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InferenceResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InferenceResponse {
    /// Creates a response carrying `response` and no other fields.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            extra: serde_json::Map::new(),
        }
    }

    /// Returns the response text, or `placeholder` if the field was absent.
    pub fn text_or(&self, placeholder: &str) -> String {
        self.response
            .clone()
            .unwrap_or_else(|| placeholder.to_string())
    }
}

/// Something that answers prompts.
///
/// [`crate::InferenceClient`] implements this over HTTP; the generation loop
/// only depends on the trait.
pub trait InferenceBackend {
    /// Sends `prompt` unchanged and returns the parsed reply.
    fn query(&mut self, prompt: &str) -> Result<InferenceResponse, InferenceError>;
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for &mut B {
    fn query(&mut self, prompt: &str) -> Result<InferenceResponse, InferenceError> {
        (**self).query(prompt)
    }
}
