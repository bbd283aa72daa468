//! Comment-tree harvesting: parse Reddit's nested comment listing, walk it
//! breadth-first in top-sorted order, and expand "more comments" stubs that
//! hide enough replies to matter.

use crate::api::{check_status, RedditApiClient};
use digest_core::{CommentHarvest, CoreError, RedditApiError, RedditComment, RedditThread};
use serde::{Deserialize, Deserializer};
use std::collections::VecDeque;
use tracing::{debug, error, warn};

/// Reddit resolves hidden comment ids in batches of at most 100.
const MORE_CHILDREN_BATCH: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentTreeNode {
    #[serde(rename = "t1")]
    Comment(Box<CommentData>),
    #[serde(rename = "more")]
    More(MoreData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentData {
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "replies_listing")]
    pub replies: Vec<CommentTreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreData {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentListing {
    pub data: CommentListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentListingData {
    #[serde(default)]
    pub children: Vec<CommentTreeNode>,
}

/// The comments endpoint returns a two-element array: the submission
/// listing, then the comment listing.
type ThreadCommentsResponse = (serde_json::Value, CommentListing);

#[derive(Debug, Deserialize)]
struct MoreChildrenEnvelope {
    json: MoreChildrenBody,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenBody {
    #[serde(default)]
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<CommentTreeNode>,
}

/// The `replies` field is `""` on leaf comments and a listing otherwise.
fn replies_listing<'de, D>(deserializer: D) -> Result<Vec<CommentTreeNode>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawReplies {
        Listing(CommentListing),
        Empty(String),
    }

    Ok(match RawReplies::deserialize(deserializer)? {
        RawReplies::Listing(listing) => listing.data.children,
        RawReplies::Empty(_) => Vec::new(),
    })
}

/// Breadth-first walk over a parsed comment tree.
///
/// The walk itself never touches the network: when it reaches a stub worth
/// expanding it hands the stub back to the caller, who fetches the hidden
/// nodes and feeds them in with [`TreeWalk::enqueue`].
#[derive(Debug)]
pub struct TreeWalk {
    queue: VecDeque<CommentTreeNode>,
    cap: usize,
    more_threshold: u32,
}

impl TreeWalk {
    pub fn new(roots: Vec<CommentTreeNode>, cap: usize, more_threshold: u32) -> Self {
        Self {
            queue: roots.into(),
            cap,
            more_threshold,
        }
    }

    /// Drain comments into `out` until the cap is reached, the queue runs
    /// dry, or a stub needs expansion. Comments with empty bodies are
    /// dropped and do not count against the cap.
    pub fn next_expansion(&mut self, out: &mut Vec<RedditComment>) -> Option<MoreData> {
        loop {
            if out.len() >= self.cap {
                debug!("Comment cap reached at {} comments", out.len());
                return None;
            }
            let node = self.queue.pop_front()?;
            match node {
                CommentTreeNode::Comment(comment) => {
                    if !comment.body.is_empty() {
                        out.push(RedditComment { body: comment.body });
                    }
                    self.queue.extend(comment.replies);
                }
                CommentTreeNode::More(more) => {
                    if more.count >= self.more_threshold && !more.children.is_empty() {
                        return Some(more);
                    }
                    debug!("Skipping small comment stub ({} hidden)", more.count);
                }
            }
        }
    }

    pub fn enqueue(&mut self, nodes: Vec<CommentTreeNode>) {
        self.queue.extend(nodes);
    }
}

impl RedditApiClient {
    /// Top-sorted comments for `thread`, up to `cap` with usable bodies.
    /// A mid-walk failure keeps what was collected alongside the error.
    pub async fn harvest_comments(
        &self,
        thread: &RedditThread,
        cap: usize,
        more_threshold: u32,
    ) -> CommentHarvest {
        let mut comments = Vec::new();
        match self
            .walk_comment_tree(thread, cap, more_threshold, &mut comments)
            .await
        {
            Ok(()) => CommentHarvest::complete(comments),
            Err(error) => {
                warn!(
                    "Comment walk for {} stopped early after {} comments: {}",
                    thread.id,
                    comments.len(),
                    error
                );
                CommentHarvest::interrupted(comments, error)
            }
        }
    }

    async fn walk_comment_tree(
        &self,
        thread: &RedditThread,
        cap: usize,
        more_threshold: u32,
        out: &mut Vec<RedditComment>,
    ) -> Result<(), CoreError> {
        let endpoint = format!("/comments/{}", thread.id);
        let params = [("sort", "top"), ("limit", "500"), ("raw_json", "1")];
        let response = self.send_get(&endpoint, &params).await?;
        check_status(
            &endpoint,
            &response,
            RedditApiError::PostNotFound {
                post_id: thread.id.clone(),
            },
        )?;

        let parsed: ThreadCommentsResponse = response.json().await.map_err(|e| {
            error!("Failed to parse comment tree for {}: {}", thread.id, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse comment tree for {}", thread.id),
            })
        })?;

        let mut walk = TreeWalk::new(parsed.1.data.children, cap, more_threshold);
        while let Some(more) = walk.next_expansion(out) {
            let hidden = self.fetch_more_children(&thread.id, &more.children).await?;
            walk.enqueue(hidden);
        }
        Ok(())
    }

    async fn fetch_more_children(
        &self,
        post_id: &str,
        children: &[String],
    ) -> Result<Vec<CommentTreeNode>, CoreError> {
        let link_id = format!("t3_{}", post_id);
        let mut nodes = Vec::new();

        for batch in children.chunks(MORE_CHILDREN_BATCH) {
            let ids = batch.join(",");
            debug!("Expanding {} hidden comments under {}", batch.len(), link_id);
            let params = [
                ("api_type", "json"),
                ("link_id", link_id.as_str()),
                ("children", ids.as_str()),
                ("sort", "top"),
                ("raw_json", "1"),
            ];
            let response = self.send_get("/api/morechildren", &params).await?;
            check_status(
                "/api/morechildren",
                &response,
                RedditApiError::PostNotFound {
                    post_id: post_id.to_string(),
                },
            )?;

            let envelope: MoreChildrenEnvelope = response.json().await.map_err(|e| {
                error!("Failed to parse morechildren response: {}", e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: "Failed to parse morechildren response".to_string(),
                })
            })?;
            if let Some(data) = envelope.json.data {
                nodes.extend(data.things);
            }
        }
        Ok(nodes)
    }
}
