//! Grounded Generator: one prompt, a prefilled reply turn, a stop-sequence
//! contract, and a fixed retry bound.
//!
//! The model reply starts where the prefill leaves off. Callers that parse the
//! reply must put the prefill back in front first (`GenerationOutcome::with_prefix`).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::llm_client::{LlmError, Message, ModelInvoker, ModelRequest, SamplingParams};

/// Wait between failed attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Fixed-backoff, fixed-bound retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first. Treated as at least 1.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model_id: String,
    /// User turn: instructions plus the content under review.
    pub prompt: String,
    pub system_context: Option<String>,
    pub stop_sequences: Vec<String>,
    /// Seeds the assistant turn so the reply opens with a fixed structure.
    pub prefill: String,
    pub max_tokens: u32,
    pub sampling: SamplingParams,
}

impl GenerationRequest {
    fn to_model_request(&self) -> ModelRequest {
        let mut messages = vec![Message::user(self.prompt.as_str())];
        if !self.prefill.is_empty() {
            messages.push(Message::assistant(self.prefill.as_str()));
        }
        ModelRequest {
            model_id: self.model_id.clone(),
            system: self.system_context.clone(),
            messages,
            max_tokens: self.max_tokens,
            stop_sequences: self.stop_sequences.clone(),
            sampling: self.sampling,
        }
    }
}

/// Result of one `generate` call. Consumed immediately by the caller; never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// The model's continuation, without the prefill.
    Success(String),
    Failure { reason: String, attempts_made: u32 },
}

impl GenerationOutcome {
    /// Re-attaches `prefix` (normally the prefill) to a successful continuation.
    pub fn with_prefix(self, prefix: &str) -> Self {
        match self {
            GenerationOutcome::Success(text) => GenerationOutcome::Success(format!("{prefix}{text}")),
            failure => failure,
        }
    }
}

pub struct GroundedGenerator {
    invoker: Arc<dyn ModelInvoker>,
    policy: RetryPolicy,
}

impl GroundedGenerator {
    pub fn new(invoker: Arc<dyn ModelInvoker>, policy: RetryPolicy) -> Self {
        Self { invoker, policy }
    }

    /// Calls the model until it answers, a non-transient error occurs, or the
    /// attempt bound is reached. Never loops past `max_attempts`.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let model_request = request.to_model_request();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<LlmError> = None;

        for attempt in 1..=max_attempts {
            match self.invoker.invoke(&model_request).await {
                Ok(text) => {
                    debug!("Generation succeeded on attempt {attempt}/{max_attempts}");
                    return GenerationOutcome::Success(text);
                }
                Err(e) if !e.is_transient() => {
                    warn!("Generation attempt {attempt} failed with a non-retryable error: {e}");
                    return GenerationOutcome::Failure {
                        reason: e.to_string(),
                        attempts_made: attempt,
                    };
                }
                Err(e) => {
                    warn!("Generation attempt {attempt}/{max_attempts} failed: {e}");
                    last_error = Some(e);
                }
            }

            if attempt < max_attempts {
                debug!(
                    "Retrying in {}ms (attempt {})",
                    self.policy.backoff.as_millis(),
                    attempt + 1
                );
                tokio::time::sleep(self.policy.backoff).await;
            }
        }

        warn!("Maximum generation attempts ({max_attempts}) reached");
        GenerationOutcome::Failure {
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_string()),
            attempts_made: max_attempts,
        }
    }
}
