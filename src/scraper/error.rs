use thiserror::Error;

/// Why a response was judged to be a block rather than a post page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockReason {
    #[error("login required (post is likely private)")]
    LoginWall,
    #[error("age-restricted content")]
    AgeRestricted,
    #[error("rate limited by Instagram (HTTP 429)")]
    RateLimited,
    #[error("HTTP {0}")]
    HttpStatus(u16),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("invalid or unsupported Instagram URL: {0}")]
    InvalidUrl(String),

    #[error("post not found")]
    NotFound,

    #[error("request blocked: {0}")]
    Blocked(BlockReason),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(
        "failed to extract media after {attempts} attempts (last error: {cause}). \
         The post may be private or deleted, Instagram may be blocking requests, \
         the page structure may have changed, or the URL may be incorrect"
    )]
    ExtractionFailed {
        attempts: u32,
        cause: Box<ExtractError>,
    },
}

impl ExtractError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::InvalidUrl(_) => "invalid_url",
            ExtractError::NotFound => "not_found",
            ExtractError::Blocked(_) => "blocked",
            ExtractError::Transport(_) => "transport_error",
            ExtractError::ExtractionFailed { .. } => "extraction_failed",
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ExtractError::InvalidUrl(_) | ExtractError::ExtractionFailed { .. }
        )
    }

    /// HTTP status the API layer reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ExtractError::InvalidUrl(_) => 400,
            ExtractError::NotFound => 404,
            ExtractError::Blocked(_) => 403,
            ExtractError::Transport(_) => 502,
            ExtractError::ExtractionFailed { .. } => 422,
        }
    }
}
