use thiserror::Error;

/// A convenience `Result` alias using [`CoveyError`].
pub type CoveyResult<T> = Result<T, CoveyError>;

/// Top-level error type for Covey.
#[derive(Error, Debug)]
pub enum CoveyError {
    /// A task or lookup referenced an agent id that was never registered.
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// An agent id was registered twice.
    #[error("Duplicate agent: {0}")]
    DuplicateAgent(String),

    /// The executor was handed a run with nothing to do.
    #[error("Task list is empty")]
    EmptyTaskList,

    /// The inference backend rejected or failed a completion request.
    #[error("Inference error: {0}")]
    Inference(String),

    /// An outbound HTTP request failed at the transport or status level.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered, but the completion could not be used.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid configuration or registry misuse.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoveyError {
    /// Registry and configuration errors abort a whole submission; everything
    /// else is recoverable at the task level.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            CoveyError::UnknownAgent(_)
                | CoveyError::DuplicateAgent(_)
                | CoveyError::EmptyTaskList
                | CoveyError::Config(_)
        )
    }
}
