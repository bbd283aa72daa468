use crate::auth;
use digest_core::{CoreError, RedditApiError, RedditThread};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub stickied: bool,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    access_token: Option<String>,
}

impl RedditApiClient {
    pub fn new(user_agent: &str) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            access_token: None,
        })
    }

    /// Exchange app credentials for a bearer token. Must run before any
    /// listing call.
    pub async fn authenticate(
        &mut self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<(), CoreError> {
        let token = auth::request_app_token(&self.http_client, client_id, client_secret).await?;
        self.access_token = Some(token.access_token);
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub(crate) async fn send_get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(CoreError::RedditApi(RedditApiError::InvalidToken))?;
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        debug!("Making Reddit API request: GET {}", endpoint);
        self.http_client
            .get(&url)
            .bearer_auth(token)
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for GET {}: {}", endpoint, e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })
    }

    /// Top posts of the past day for `subreddit`, in Reddit's order.
    pub async fn fetch_top_threads(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RedditThread>, CoreError> {
        let endpoint = format!("/r/{}/top", subreddit);
        let limit_str = limit.to_string();
        let params = [("t", "day"), ("limit", limit_str.as_str()), ("raw_json", "1")];

        info!("Fetching top {} posts of the day from r/{}", limit, subreddit);
        let response = self.send_get(&endpoint, &params).await?;
        check_status(
            &endpoint,
            &response,
            RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            },
        )?;

        let listing: RedditListing<SubmissionData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into())
            .collect())
    }
}

/// Map a non-success status to the matching API error. `missing` is what a
/// 404 means at this endpoint.
pub(crate) fn check_status(
    endpoint: &str,
    response: &Response,
    missing: RedditApiError,
) -> Result<(), CoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    error!("Request failed with status: {} for {}", status, endpoint);

    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60);
        warn!("Rate limited, retry after {} seconds", retry_after);
        return Err(RedditApiError::RateLimitExceeded { retry_after }.into());
    }

    let error = match status.as_u16() {
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => missing,
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("unexpected status {} for {}", code, endpoint),
        },
    };
    Err(error.into())
}

impl From<SubmissionData> for RedditThread {
    fn from(submission: SubmissionData) -> Self {
        Self {
            id: submission.id,
            title: submission.title,
            permalink: submission.permalink,
            body: submission.selftext,
            stickied: submission.stickied,
            score: submission.score,
            num_comments: submission.num_comments,
        }
    }
}
