use thiserror::Error;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch earthquake data. Please try again later.";
pub const NO_DATA_MESSAGE: &str = "No earthquake data available";

/// Everything that can go wrong while pulling the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed responded with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response has no `features` collection")]
    MalformedPayload,
}

impl FeedError {
    /// Text shown to the user. Only two messages exist: one for transport
    /// or parse problems, one for a payload without data.
    pub fn user_message(&self) -> &'static str {
        match self {
            FeedError::MalformedPayload => NO_DATA_MESSAGE,
            FeedError::Transport(_) | FeedError::Status(_) | FeedError::Decode(_) => {
                FETCH_FAILED_MESSAGE
            }
        }
    }
}
