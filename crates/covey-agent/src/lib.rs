//! Inference contract and completion backends for Covey agents.
//!
//! The orchestrator only ever talks to [`InferenceBackend`]: a prompt and a
//! model id go in, a [`Completion`] or an error comes out. Transport,
//! authentication, and provider quirks live behind that trait.
//!
//! # Main types
//!
//! - [`InferenceBackend`]: The `invoke(prompt, model_id, options)` contract.
//! - [`InferenceOptions`]: Per-call sampling options (`max_tokens`, `temperature`).
//! - [`Completion`] / [`Usage`]: A successful completion and its token usage.
//! - [`BackendConfig`] / [`LlmProvider`]: Which provider to reach and how.
//! - [`LlmClient`]: Dispatches to the provider-specific backend.

/// Provider backends and the [`InferenceBackend`] trait.
pub mod backends;
/// Provider selection and endpoint configuration.
pub mod config;
/// Completion types and the dispatching [`LlmClient`].
pub mod llm;

pub use backends::InferenceBackend;
pub use config::{BackendConfig, LlmProvider};
pub use llm::{Completion, InferenceOptions, LlmClient, Usage};
