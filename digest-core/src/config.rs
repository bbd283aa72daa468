use crate::error::{ConfigError, CoreError};
use std::env;
use std::path::PathBuf;

/// Run options with the r/AmItheAsshole daily defaults.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub subreddit: String,
    /// Top posts of the past day to analyze.
    pub post_limit: u32,
    /// Comments examined per post, counting only those with a usable body.
    pub comment_limit: usize,
    /// "More comments" stubs hiding fewer replies than this are not expanded.
    pub more_comments_threshold: u32,
    /// Character budget for body summaries.
    pub summary_max_chars: usize,
    pub gemini_model: String,
    pub output_file: PathBuf,
    pub user_agent: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            subreddit: "AmItheAsshole".to_string(),
            post_limit: 10,
            comment_limit: 200,
            more_comments_threshold: 15,
            summary_max_chars: 800,
            gemini_model: "gemini-2.0-flash-exp".to_string(),
            output_file: PathBuf::from("top_aita_posts.json"),
            user_agent: "aita-digest/0.1 (daily top posts reader)".to_string(),
        }
    }
}

impl DigestConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.subreddit.trim().is_empty() {
            return Err(invalid("subreddit", &self.subreddit));
        }
        if self.post_limit == 0 {
            return Err(invalid("post_limit", "0"));
        }
        if self.comment_limit == 0 {
            return Err(invalid("comment_limit", "0"));
        }
        if self.summary_max_chars < 4 {
            // The truncation fallback appends "..." on top of the budget.
            return Err(invalid(
                "summary_max_chars",
                &self.summary_max_chars.to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> CoreError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

/// API secrets, read from the environment and never from flags.
#[derive(Clone)]
pub struct Credentials {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub google_api_key: String,
}

impl Credentials {
    /// Missing or blank variables are fatal before any network call.
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self {
            reddit_client_id: require_env("REDDIT_CLIENT_ID")?,
            reddit_client_secret: require_env("REDDIT_CLIENT_SECRET")?,
            google_api_key: require_env("GOOGLE_API_KEY")?,
        })
    }
}

fn require_env(var_name: &str) -> Result<String, CoreError> {
    match env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        }
        .into()),
    }
}
