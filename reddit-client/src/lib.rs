pub mod api;
pub mod auth;
pub mod comments;

pub use api::{RedditApiClient, RedditListing, RedditListingChild, RedditListingData};
pub use auth::AccessToken;
pub use comments::{CommentTreeNode, MoreData, TreeWalk};

use digest_core::{CommentHarvest, CoreError, RedditThread};

/// Read-only access to the forum being digested. The pipeline drives this
/// seam so tests can swap in scripted sources.
pub trait ForumSource {
    /// Top threads of the past day for `subreddit`, best first.
    async fn top_threads(&self, subreddit: &str, limit: u32)
        -> Result<Vec<RedditThread>, CoreError>;

    /// Up to `cap` top-sorted comments for `thread`. Stubs hiding fewer
    /// than `more_threshold` replies are left collapsed.
    async fn top_comments(
        &self,
        thread: &RedditThread,
        cap: usize,
        more_threshold: u32,
    ) -> CommentHarvest;
}

impl ForumSource for RedditApiClient {
    async fn top_threads(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RedditThread>, CoreError> {
        self.fetch_top_threads(subreddit, limit).await
    }

    async fn top_comments(
        &self,
        thread: &RedditThread,
        cap: usize,
        more_threshold: u32,
    ) -> CommentHarvest {
        self.harvest_comments(thread, cap, more_threshold).await
    }
}
