use chrono::Utc;
use digest_core::{CommentClassifier, DigestConfig, JudgmentCounts, PostRecord, RedditThread};
use llm_interface::{GenerativeModel, Summarizer};
use reddit_client::ForumSource;
use tracing::{debug, error, info, warn};

const TITLE_PREVIEW_CHARS: usize = 50;

/// Threads worth analyzing. Pinned megathreads and posts whose bodies were
/// removed carry no story to judge.
fn qualifies(thread: &RedditThread) -> bool {
    if thread.stickied {
        return false;
    }
    let body = thread.body.trim();
    !body.is_empty() && body != "[removed]" && body != "[deleted]"
}

fn title_preview(title: &str) -> String {
    if title.chars().count() <= TITLE_PREVIEW_CHARS {
        return title.to_string();
    }
    let prefix: String = title.chars().take(TITLE_PREVIEW_CHARS).collect();
    format!("{}...", prefix)
}

/// Runs the daily digest: fetch the top threads, tally the judgments in
/// each thread's comments, and summarize each post body.
///
/// A failed listing fetch produces an empty batch. Per-thread failures
/// degrade instead: partial comment walks keep what was gathered, and
/// summarization falls back to truncation inside the summarizer.
pub async fn run<F, M>(
    config: &DigestConfig,
    forum: &F,
    summarizer: &Summarizer<M>,
) -> Vec<PostRecord>
where
    F: ForumSource,
    M: GenerativeModel,
{
    let threads = match forum.top_threads(&config.subreddit, config.post_limit).await {
        Ok(threads) => threads,
        Err(error) => {
            error!(
                "Failed to fetch top threads from r/{}: {}",
                config.subreddit, error
            );
            return Vec::new();
        }
    };
    info!(
        "Fetched {} top threads from r/{}",
        threads.len(),
        config.subreddit
    );

    let classifier = CommentClassifier::new();
    let mut records = Vec::new();

    for thread in &threads {
        if !qualifies(thread) {
            debug!(
                "Skipping '{}': stickied or no readable body",
                title_preview(&thread.title)
            );
            continue;
        }
        info!(
            "Analyzing '{}' ({} comments)",
            title_preview(&thread.title),
            thread.num_comments
        );

        let harvest = forum
            .top_comments(thread, config.comment_limit, config.more_comments_threshold)
            .await;
        if harvest.is_partial() {
            warn!(
                "Comment walk for {} stopped early; analyzing the {} comments gathered",
                thread.id,
                harvest.comments.len()
            );
        }

        let mut judgments = JudgmentCounts::new();
        for comment in &harvest.comments {
            if let Some(judgment) = classifier.classify(&comment.body) {
                judgments.record(judgment);
            }
        }
        let verdict = judgments.verdict();
        debug!(
            "Verdict for {}: {} ({} judged)",
            thread.id, verdict, judgments.total_judged
        );

        let body_summary = summarizer
            .summarize(&thread.body, config.summary_max_chars)
            .await;

        records.push(PostRecord {
            id: thread.id.clone(),
            title: thread.title.clone(),
            url: thread.permalink.clone(),
            body_summary,
            total_judged: judgments.total_judged,
            reddit_verdict: verdict,
            reddit_judgments: judgments,
            fetched_utc: Utc::now(),
        });
    }

    records
}
