use std::time::Duration;

/// Default host of the local inference server.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port of the local inference server.
pub const DEFAULT_PORT: u16 = 11434;

/// Model used for generation and verification calls.
pub const DEFAULT_MODEL: &str = "llama3";
/// Model used by the connectivity probe.
pub const DEFAULT_PROBE_MODEL: &str = "llama3.2";

/// Timeout of the connectivity probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout of a generation or verification call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(300);

/// Literal text that ends the verification loop when present in a response.
pub const DEFAULT_MARKER: &str = "free of syntax errors";
/// Verification calls allowed before the loop gives up.
pub const DEFAULT_MAX_VERIFICATION_ATTEMPTS: usize = 8;

/// Shown in place of the code when a generation response has no `response` field.
pub const GENERATION_PLACEHOLDER: &str = "No SCAD code returned.";
/// Shown in place of the code when a verification response has no `response` field.
pub const VERIFICATION_PLACEHOLDER: &str = "No verified SCAD code returned.";

/// Instructions prepended to the user prompt on the generation call.
pub const DEFAULT_GENERATION_TEMPLATE: &str = " Act as an expert OpenSCAD application. Generate optimized, error-free OpenSCAD code that visually resembles the specified object.
- Ensure the object is realistic and connected appropriately (e.g., wheels attached to the body for cars, structural elements in houses).
- Ensure that the output is valid OpenSCAD syntax, with all statements properly formatted.
- Avoid syntax errors, missing semicolons, and unmatched brackets.
- Only output the SCAD code, without any extra text or formatting. ";

/// Instructions appended to the running code on each verification call.
pub const DEFAULT_VERIFICATION_TEMPLATE: &str = " Now that you have generated the OpenSCAD code, please verify its correctness.
    Check for realistic representation (e.g., objects should be visually attached and functional in form, like wheels attached to the car).
    If any errors or misrepresentations are found, correct them before outputting the final code.
    Check for any syntax errors, missing semicolons, or other issues that may prevent the code from running properly.
    If any errors are found, correct them before outputting the final code.
    Ensure that the output is valid OpenSCAD syntax, with all statements properly formatted.
    Only output the SCAD code, without any extra text, comments, or formatting (no orscad, etc.).
    Use concise and optimized SCAD syntax that will run without errors in the latest OpenSCAD version.
    ";

/// Address of the inference server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Host name or address, without scheme.
    pub host: String,
    pub port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ConnectionConfig {
    /// Creates a config for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns `http://{host}:{port}`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Full URL of the `POST /api/generate` endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url())
    }
}

/// Everything the HTTP client needs to build a request.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub connection: ConnectionConfig,
    /// Model named in generation and verification requests.
    pub model: String,
    /// Model named in the connectivity probe.
    pub probe_model: String,
    pub probe_timeout: Duration,
    /// Per-call timeout; there is no timeout across the whole loop.
    pub query_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            model: DEFAULT_MODEL.to_string(),
            probe_model: DEFAULT_PROBE_MODEL.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// The two fixed instruction texts wrapped around the running prompt.
///
/// `generation` is prepended to the user prompt on the first call and
/// `verification` is appended to the running code on every later call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionTemplates {
    pub generation: String,
    pub verification: String,
}

impl Default for InstructionTemplates {
    fn default() -> Self {
        Self {
            generation: DEFAULT_GENERATION_TEMPLATE.to_string(),
            verification: DEFAULT_VERIFICATION_TEMPLATE.to_string(),
        }
    }
}

impl InstructionTemplates {
    /// Creates templates from the two instruction texts.
    pub fn new(generation: impl Into<String>, verification: impl Into<String>) -> Self {
        Self {
            generation: generation.into(),
            verification: verification.into(),
        }
    }

    /// Body of the generation call: template first, then the prompt.
    pub fn generation_prompt(&self, user_prompt: &str) -> String {
        format!("{}{}", self.generation, user_prompt)
    }

    /// Body of a verification call: code first, then the template.
    pub fn verification_prompt(&self, code: &str) -> String {
        format!("{}{}", code, self.verification)
    }
}

/// Bounds of the verify-and-correct stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopConfig {
    /// Upper bound on verification calls. Zero skips verification entirely.
    pub max_verification_attempts: usize,
    /// Case-sensitive substring that marks a response as final.
    pub marker: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_verification_attempts: DEFAULT_MAX_VERIFICATION_ATTEMPTS,
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_defaults() {
        let connection = ConnectionConfig::default();
        assert_eq!(connection.host, "127.0.0.1");
        assert_eq!(connection.port, 11434);
        assert_eq!(
            connection.generate_url(),
            "http://127.0.0.1:11434/api/generate"
        );
    }

    #[test]
    fn test_custom_connection_url() {
        let connection = ConnectionConfig::new("inference.local", 8080);
        assert_eq!(connection.base_url(), "http://inference.local:8080");
    }

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.model, "llama3");
        assert_eq!(config.probe_model, "llama3.2");
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.query_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_templates_wrap_without_separator() {
        let templates = InstructionTemplates::new("GEN:", ":VERIFY");
        assert_eq!(templates.generation_prompt("a mug"), "GEN:a mug");
        assert_eq!(templates.verification_prompt("cube(1);"), "cube(1);:VERIFY");
    }

    #[test]
    fn test_default_templates_mention_openscad() {
        let templates = InstructionTemplates::default();
        assert!(templates.generation.contains("OpenSCAD"));
        assert!(templates.verification.contains("verify its correctness"));
    }

    #[test]
    fn test_loop_defaults() {
        let config = LoopConfig::default();
        assert_eq!(config.marker, "free of syntax errors");
        assert_eq!(config.max_verification_attempts, 8);
    }
}
