use thiserror::Error;

/// Everything that can go wrong during one analyze request/response cycle.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("text must not be empty")]
    EmptyInput,

    #[error("analysis provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),

    #[error("could not reach the analysis service: {0}")]
    ClientNetworkError(String),

    #[error("an analysis is already in progress")]
    AnalysisInFlight,
}

impl AnalyzeError {
    /// True for errors the user fixes by changing their input rather than retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AnalyzeError::EmptyInput)
    }
}

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("preference store is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
