use std::path::PathBuf;

use clap::{Parser, Subcommand};
use digest_core::{CoreError, DigestConfig};

/// Fetches the day's top r/AmItheAsshole posts, tallies the community
/// judgments in their comments, and writes the digest to a JSON file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subreddit to scan (without the /r/ prefix)
    #[arg(long)]
    pub subreddit: Option<String>,
    /// Number of top posts to analyze
    #[arg(long)]
    pub posts: Option<u32>,
    /// Maximum comments to read per post
    #[arg(long)]
    pub comment_limit: Option<usize>,
    /// Character budget for post body summaries
    #[arg(long)]
    pub max_chars: Option<usize>,
    /// Gemini model used for summarization
    #[arg(long)]
    pub model: Option<String>,
    /// Output file path
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the Gemini models available to the configured API key
    ListModels,
}

impl Cli {
    /// Merges command-line overrides onto the default configuration.
    pub fn into_config(self) -> Result<DigestConfig, CoreError> {
        let mut config = DigestConfig::default();
        if let Some(subreddit) = self.subreddit {
            config.subreddit = subreddit;
        }
        if let Some(posts) = self.posts {
            config.post_limit = posts;
        }
        if let Some(comment_limit) = self.comment_limit {
            config.comment_limit = comment_limit;
        }
        if let Some(max_chars) = self.max_chars {
            config.summary_max_chars = max_chars;
        }
        if let Some(model) = self.model {
            config.gemini_model = model;
        }
        if let Some(output) = self.output {
            config.output_file = output;
        }
        config.validate()?;
        Ok(config)
    }
}
