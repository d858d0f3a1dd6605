//! Prompt-to-OpenSCAD generation against a locally hosted inference server.
//!
//! A user prompt is wrapped in a generation template and sent to the
//! server's `POST /api/generate` endpoint. The returned source is then fed
//! back with a verification template, over and over, until a response
//! contains the marker text `"free of syntax errors"` or the attempt cap is
//! reached.
//!
//! ```no_run
//! use infernum_cad::{
//!     ClientConfig, ConsoleSink, GenerationLoop, InferenceClient, InstructionTemplates,
//!     LoopConfig,
//! };
//!
//! let client = InferenceClient::new(ClientConfig::default());
//! let mut engine = GenerationLoop::new(
//!     client,
//!     InstructionTemplates::default(),
//!     LoopConfig::default(),
//! );
//! let outcome = engine.generate("a small car", &mut ConsoleSink::stdio());
//! println!("{:?}", outcome.code());
//! ```

mod client;
mod config;
mod engine;
mod error;
mod model;
mod sink;

pub use client::InferenceClient;
pub use config::{
    ClientConfig, ConnectionConfig, DEFAULT_GENERATION_TEMPLATE, DEFAULT_HOST, DEFAULT_MARKER,
    DEFAULT_MAX_VERIFICATION_ATTEMPTS, DEFAULT_MODEL, DEFAULT_PORT, DEFAULT_PROBE_MODEL,
    DEFAULT_PROBE_TIMEOUT, DEFAULT_QUERY_TIMEOUT, DEFAULT_VERIFICATION_TEMPLATE,
    GENERATION_PLACEHOLDER, InstructionTemplates, LoopConfig, VERIFICATION_PLACEHOLDER,
};
pub use engine::{
    CancellationToken, EMPTY_PROMPT_MESSAGE, GENERATION_FAILURE_MESSAGE, GenerationLoop,
    GenerationOutcome, GenerationState, INPUT_ERROR_TITLE,
};
pub use error::InferenceError;
pub use model::{InferenceBackend, InferenceRequest, InferenceResponse};
pub use sink::{ConsoleSink, PresentationSink};
