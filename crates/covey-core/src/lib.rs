//! Core error definitions for the Covey orchestrator.
//!
//! Every Covey crate reports failures through [`CoveyError`]. Per-task
//! failures (backend errors, timeouts, malformed completions) are recorded as
//! task results by the orchestrator and never escape a run; only registry and
//! configuration errors abort a submission.
//!
//! # Main types
//!
//! - [`CoveyError`]: Unified error enum for all Covey subsystems.
//! - [`CoveyResult`]: Convenience alias for `Result<T, CoveyError>`.

/// Error enum and result alias.
pub mod error;

pub use error::{CoveyError, CoveyResult};
