/// Anthropic messages API backend.
pub mod claude;
/// OpenAI-compatible chat completions backend.
pub mod openai;

use crate::llm::{Completion, InferenceOptions};
use async_trait::async_trait;
use covey_core::CoveyResult;

/// The inference contract every completion provider implements.
///
/// Implementations must not retry: a failure is reported once and the
/// orchestrator records it against the task. Implementations need not support
/// cancellation either; a call may keep running after its caller stopped
/// waiting for it.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `InferenceBackend` for your struct
/// 3. Add the variant to `LlmProvider` in `config.rs`
/// 4. Wire it up in `LlmClient::new()` in `llm.rs`
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Complete `prompt` with `model_id`.
    async fn invoke(
        &self,
        prompt: &str,
        model_id: &str,
        options: &InferenceOptions,
    ) -> CoveyResult<Completion>;
}
