use thiserror::Error;

/// Failure talking to the inspection server.
///
/// Callers mostly care about two buckets: [`UpstreamError::NotFound`] (the
/// server answered, the entity does not exist) and everything else (the
/// server could not be used, see [`UpstreamError::is_unreachable`]).
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0} not found on inspection server")]
    NotFound(String),

    #[error("inspection server unreachable: {0}")]
    Unreachable(String),

    #[error("inspection server timed out")]
    Timeout,

    #[error("inspection server answered HTTP {status}")]
    Rejected { status: u16 },

    #[error("invalid response from inspection server: {0}")]
    InvalidResponse(String),

    #[error("invalid inspection server URL: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::NotFound(_))
    }

    pub fn is_unreachable(&self) -> bool {
        !self.is_not_found()
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
