//! Error taxonomy surfaced to consumers of the search pipeline

/// Failure of one remote search call.
///
/// The `Display` text is what the presentation layer shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The backend answered, but had nothing for this query.
    #[error("Query request failed: no items for query '{query}'")]
    NoResults { query: String },

    /// HTTP 403 with the remaining rate-limit budget at zero.
    #[error("Query request failed: too many requests per minute")]
    RateLimited,

    #[error("HTTP error {status}")]
    Http { status: u16 },

    /// Connect/read timeouts, connection resets and other transport failures.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded.
    #[error("Malformed response: {0}")]
    Parse(String),
}

impl SearchError {
    pub fn no_results(query: impl Into<String>) -> Self {
        Self::NoResults {
            query: query.into(),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Parse(err.to_string())
        } else {
            SearchError::Transport(err.to_string())
        }
    }
}
