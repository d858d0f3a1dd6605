use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::config::{
    GENERATION_PLACEHOLDER, InstructionTemplates, LoopConfig, VERIFICATION_PLACEHOLDER,
};
use crate::model::InferenceBackend;
use crate::sink::PresentationSink;

/// Title of the warning shown for an empty prompt.
pub const INPUT_ERROR_TITLE: &str = "Input Error";
/// Body of the warning shown for an empty prompt.
pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt.";
/// Appended to the output once when the generation call fails.
pub const GENERATION_FAILURE_MESSAGE: &str = "Error: Unable to generate SCAD code.";

/// Where the loop currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating,
    Verifying,
}

impl GenerationState {
    /// Returns the state as a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationState::Idle => "idle",
            GenerationState::Generating => "generating",
            GenerationState::Verifying => "verifying",
        }
    }
}

/// Shared flag that stops the verification stage before its next call.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the loop before its next verification call.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns whether [`CancellationToken::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation so the loop can run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// How a run of the loop ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The prompt was empty; nothing was sent.
    InvalidPrompt,
    /// The generation call produced no result.
    GenerationFailed,
    /// A verification response contained the marker.
    Verified {
        code: String,
        verification_calls: usize,
    },
    /// The attempt cap was reached without seeing the marker.
    Exhausted {
        code: String,
        verification_calls: usize,
    },
    /// A verification call produced no result. `code` is the last good text.
    VerificationFailed {
        code: String,
        verification_calls: usize,
    },
    /// The token was cancelled before the next verification call.
    Cancelled {
        code: String,
        verification_calls: usize,
    },
}

impl GenerationOutcome {
    /// The last text shown to the user, if any code was produced.
    pub fn code(&self) -> Option<&str> {
        match self {
            GenerationOutcome::InvalidPrompt | GenerationOutcome::GenerationFailed => None,
            GenerationOutcome::Verified { code, .. }
            | GenerationOutcome::Exhausted { code, .. }
            | GenerationOutcome::VerificationFailed { code, .. }
            | GenerationOutcome::Cancelled { code, .. } => Some(code),
        }
    }

    /// Number of verification calls that were issued.
    pub fn verification_calls(&self) -> usize {
        match self {
            GenerationOutcome::InvalidPrompt | GenerationOutcome::GenerationFailed => 0,
            GenerationOutcome::Verified {
                verification_calls, ..
            }
            | GenerationOutcome::Exhausted {
                verification_calls, ..
            }
            | GenerationOutcome::VerificationFailed {
                verification_calls, ..
            }
            | GenerationOutcome::Cancelled {
                verification_calls, ..
            } => *verification_calls,
        }
    }

    /// Returns whether the marker was seen.
    pub fn is_verified(&self) -> bool {
        matches!(self, GenerationOutcome::Verified { .. })
    }
}

/// Drives the generate, then verify-and-correct, protocol.
///
/// One generation call wraps the user prompt in the generation template.
/// Each verification call appends the verification template to the text
/// returned by the previous call. The loop stops on the first response
/// containing the marker, after `max_verification_attempts` calls, when a
/// call fails, or when the cancellation token is set. Every call is issued
/// and awaited on the caller's thread.
pub struct GenerationLoop<B: InferenceBackend> {
    backend: B,
    templates: InstructionTemplates,
    config: LoopConfig,
    state: GenerationState,
    cancel: CancellationToken,
}

impl<B: InferenceBackend> GenerationLoop<B> {
    /// Creates an idle loop over `backend` with the given templates and bounds.
    pub fn new(backend: B, templates: InstructionTemplates, config: LoopConfig) -> Self {
        Self {
            backend,
            templates,
            config,
            state: GenerationState::Idle,
            cancel: CancellationToken::new(),
        }
    }

    /// Returns the current state of the loop.
    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Returns a handle that stops the loop before its next verification call.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The backend every call is sent through.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs the full protocol for `prompt`.
    ///
    /// The prompt is sent exactly as given. An empty prompt produces a
    /// warning and no network call.
    pub fn generate<S>(&mut self, prompt: &str, sink: &mut S) -> GenerationOutcome
    where
        S: PresentationSink + ?Sized,
    {
        if prompt.is_empty() {
            log::debug!("Rejecting empty prompt");
            sink.show_warning(INPUT_ERROR_TITLE, EMPTY_PROMPT_MESSAGE);
            return GenerationOutcome::InvalidPrompt;
        }

        self.state = GenerationState::Generating;
        log::debug!("Scheduling generation call");

        let response = match self
            .backend
            .query(&self.templates.generation_prompt(prompt))
        {
            Ok(response) => response,
            Err(err) => {
                log::error!("Generation call failed: {}", err);
                self.state = GenerationState::Idle;
                sink.show_failure(GENERATION_FAILURE_MESSAGE);
                return GenerationOutcome::GenerationFailed;
            }
        };

        log::debug!("Generation completed");
        let code = response.text_or(GENERATION_PLACEHOLDER);
        sink.show_text(&code);

        self.verify(&code, sink)
    }

    /// Runs only the verification stage, starting from `code`.
    pub fn verify<S>(&mut self, code: &str, sink: &mut S) -> GenerationOutcome
    where
        S: PresentationSink + ?Sized,
    {
        self.state = GenerationState::Verifying;
        let outcome = self.run_verification(code.to_string(), sink);
        self.state = GenerationState::Idle;
        outcome
    }

    fn run_verification<S>(&mut self, mut current_code: String, sink: &mut S) -> GenerationOutcome
    where
        S: PresentationSink + ?Sized,
    {
        let max_attempts = self.config.max_verification_attempts;

        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                log::info!("Verification cancelled after {} call(s)", attempt - 1);
                return GenerationOutcome::Cancelled {
                    code: current_code,
                    verification_calls: attempt - 1,
                };
            }

            log::debug!("Verification call {}/{}", attempt, max_attempts);
            let prompt = self.templates.verification_prompt(&current_code);
            let response = match self.backend.query(&prompt) {
                Ok(response) => response,
                Err(err) => {
                    log::error!("Verification call {} failed: {}", attempt, err);
                    return GenerationOutcome::VerificationFailed {
                        code: current_code,
                        verification_calls: attempt,
                    };
                }
            };

            current_code = response.text_or(VERIFICATION_PLACEHOLDER);
            sink.show_text(&current_code);

            if current_code.contains(&self.config.marker) {
                log::info!("Verification finished after {} call(s)", attempt);
                return GenerationOutcome::Verified {
                    code: current_code,
                    verification_calls: attempt,
                };
            }
        }

        log::warn!(
            "Verification stopped after {} call(s) without the marker {:?}",
            max_attempts,
            self.config.marker
        );
        GenerationOutcome::Exhausted {
            code: current_code,
            verification_calls: max_attempts,
        }
    }
}
