use thiserror::Error;

pub type FetchResult<T> = Result<T, FetchError>;

/// Failure of a single outbound call to the dashboard backend.
///
/// Every variant is contained by the component that issued the call: chart
/// panels degrade to a title-only state and the chat panel shows its fallback
/// message. None of them is allowed to abort rendering of the dashboard.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or no response was received. An error
    /// status is not a network failure: its body is read like any other.
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The body was not valid JSON or lacked the expected shape.
    #[error("invalid response from {url}: {message}")]
    Parse { url: String, message: String },

    /// The owning component was torn down before the result could be applied.
    #[error("request to {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// Short machine-friendly name of the variant, used in the event log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Parse { .. } => "parse",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
