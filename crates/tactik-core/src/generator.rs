// ─────────────────────────────────────────────────────────────────────
// TACTIK Kernel — Generation Collaborator
// ─────────────────────────────────────────────────────────────────────
//! Interface to the language-generation backend.
//!
//! The kernel never talks to a provider directly. Production deployments
//! implement [`Generator`] over their HTTP client; `ExternalGenerator`
//! adapts a plain closure and `ScriptedGenerator` replays a fixed script
//! for tests and demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use tactik_types::TactikError;

use crate::prompt::PromptMessage;

/// Everything a backend needs to produce one candidate response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub avatar_id: String,
    pub system_prompt: String,
    pub prior_turns: Vec<PromptMessage>,
    pub user_message: String,
    /// Budget for this call. The orchestrator enforces it regardless.
    pub deadline: Duration,
    /// 1-based attempt counter within the turn, regenerations included.
    pub attempt: u32,
}

/// Transient backend failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("generation timed out after {deadline_ms} ms")]
    Timeout { deadline_ms: u64 },
}

impl From<GenerationError> for TactikError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Provider(msg) => TactikError::Provider(msg),
            GenerationError::Timeout { deadline_ms } => TactikError::Timeout { deadline_ms },
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

type GenerateFn = Arc<dyn Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync>;

/// Generator backed by a synchronous, possibly blocking function.
///
/// Each call runs on tokio's blocking pool, so a slow provider neither
/// stalls the executor nor escapes the orchestrator's deadline. A call
/// abandoned at the deadline finishes in the background and its result
/// is dropped.
pub struct ExternalGenerator {
    generate_fn: GenerateFn,
}

impl ExternalGenerator {
    pub fn new(
        generate_fn: impl Fn(&GenerationRequest) -> Result<String, GenerationError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            generate_fn: Arc::new(generate_fn),
        }
    }
}

#[async_trait]
impl Generator for ExternalGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let generate_fn = Arc::clone(&self.generate_fn);
        match tokio::task::spawn_blocking(move || generate_fn(&request)).await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(GenerationError::Provider(format!(
                "generator task failed: {join_err}"
            ))),
        }
    }
}

/// One scripted generator reaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Reply(String),
    Fail(String),
    /// Sleep, then answer with the fallback reply.
    Stall(Duration),
}

/// Replays queued steps in order, then answers every call with the
/// fallback reply. Records each request it receives.
pub struct ScriptedGenerator {
    steps: Mutex<VecDeque<ScriptStep>>,
    fallback: String,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicU32,
}

impl ScriptedGenerator {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fallback: fallback.into(),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn then(self, step: ScriptStep) -> Self {
        self.steps.lock().push_back(step);
        self
    }

    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.then(ScriptStep::Reply(text.into()))
    }

    pub fn push(&self, step: ScriptStep) {
        self.steps.lock().push_back(step);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.lock().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);
        let step = self.steps.lock().pop_front();
        match step {
            None => Ok(self.fallback.clone()),
            Some(ScriptStep::Reply(text)) => Ok(text),
            Some(ScriptStep::Fail(msg)) => Err(GenerationError::Provider(msg)),
            Some(ScriptStep::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(self.fallback.clone())
            }
        }
    }
}
