use crate::error::CoreError;
use crate::judgment::{JudgmentCounts, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RedditThread {
    pub id: String,
    pub title: String,
    pub permalink: String,
    pub body: String,
    pub stickied: bool,
    pub score: i64,
    pub num_comments: u64,
}

#[derive(Debug, Clone)]
pub struct RedditComment {
    pub body: String,
}

/// Comments collected from one thread. A failed tree walk keeps whatever
/// was gathered before the failure instead of discarding it.
#[derive(Debug)]
pub struct CommentHarvest {
    pub comments: Vec<RedditComment>,
    pub failure: Option<CoreError>,
}

impl CommentHarvest {
    pub fn complete(comments: Vec<RedditComment>) -> Self {
        Self {
            comments,
            failure: None,
        }
    }

    pub fn interrupted(comments: Vec<RedditComment>, failure: CoreError) -> Self {
        Self {
            comments,
            failure: Some(failure),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.failure.is_some()
    }
}

/// One analyzed post as it appears in the output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub body_summary: String,
    pub reddit_judgments: JudgmentCounts,
    pub total_judged: u32,
    pub reddit_verdict: Verdict,
    pub fetched_utc: DateTime<Utc>,
}
