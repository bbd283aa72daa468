use crate::error::*;
use std::time::Duration;

pub trait ErrorExt {
    fn is_rate_limited(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
}

impl ErrorExt for CoreError {
    fn is_rate_limited(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_rate_limited(),
            CoreError::Llm(e) => e.is_rate_limited(),
            // Transport and provider errors sometimes carry the quota hint
            // only in their message text.
            _ => {
                let message = self.to_string().to_lowercase();
                message.contains("429") || message.contains("quota")
            }
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(e) => e.retry_after(),
            CoreError::Llm(e) => e.retry_after(),
            _ => None,
        }
    }
}

impl ErrorExt for RedditApiError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, RedditApiError::RateLimitExceeded { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }
}

impl ErrorExt for LlmError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimitExceeded { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimitExceeded { retry_after, .. } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }
}
