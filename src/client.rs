use std::time::Duration;

use reqwest::StatusCode;

use crate::config::ClientConfig;
use crate::error::InferenceError;
use crate::model::{InferenceBackend, InferenceRequest, InferenceResponse};

const PROBE_PROMPT: &str = "Test connection.";

/// Blocking HTTP client for the inference server's generate endpoint.
///
/// Every call builds its own connection, so nothing is pooled between the
/// generation call and the verification calls that follow it.
#[derive(Clone, Debug, Default)]
pub struct InferenceClient {
    config: ClientConfig,
}

impl InferenceClient {
    /// Creates a client for the server described by `config`.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration requests are built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a throwaway prompt and reports whether the server answered.
    ///
    /// Returns `true` only for a 2xx reply whose body parses. Every failure
    /// is logged and reported as `false`.
    pub fn check_connection(&self) -> bool {
        let url = self.config.connection.generate_url();
        match self.post(&self.config.probe_model, PROBE_PROMPT, self.config.probe_timeout) {
            Ok(_) => {
                log::info!("Connection to {} successful", url);
                true
            }
            Err(err) => {
                log::warn!("Connection check against {} failed: {}", url, err);
                false
            }
        }
    }

    /// Sends `prompt` as-is with the long query timeout.
    pub fn query(&self, prompt: &str) -> Result<InferenceResponse, InferenceError> {
        self.post(&self.config.model, prompt, self.config.query_timeout)
    }

    fn post(
        &self,
        model: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<InferenceResponse, InferenceError> {
        let url = self.config.connection.generate_url();
        log::debug!("POST {} (model: {}, {} prompt bytes)", url, model, prompt.len());

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        let response = client
            .post(&url)
            .json(&InferenceRequest::new(model, prompt))
            .send()
            .map_err(|err| {
                log::error!("Error querying the inference server: {}", err);
                err
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            log::error!(
                "Error 404: the endpoint {} may not exist, or model {} is not installed",
                url,
                model
            );
            return Err(InferenceError::NotFound { url });
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            log::error!("Inference server returned {}: {}", status, body);
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|source| {
            log::error!("JSON decode error: {}", source);
            log::debug!("Response content that caused the error: {}", body);
            InferenceError::Decode { source, body }
        })
    }
}

impl InferenceBackend for InferenceClient {
    fn query(&mut self, prompt: &str) -> Result<InferenceResponse, InferenceError> {
        InferenceClient::query(self, prompt)
    }
}
