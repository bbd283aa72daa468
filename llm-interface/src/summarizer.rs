//! Resilient body summarization: model calls with exponential backoff, a
//! character budget enforced locally, and plain truncation as the fallback
//! when the model never delivers.

use crate::GenerativeModel;
use digest_core::{CoreError, ErrorExt, LlmError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Retry behavior for generation calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_factor: f64,
    /// Minimum wait when the failure looks like a rate limit.
    pub rate_limit_floor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            rate_limit_floor: Duration::from_secs(5),
        }
    }
}

/// What the schedule decided after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAttempt {
    Retry { attempt: u32, delay: Duration },
    GiveUp,
}

/// Pure retry state: the attempt counter and the compounding delay live
/// here, the caller does the sleeping.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    policy: RetryPolicy,
    attempt: u32,
    current_delay: Duration,
}

impl RetrySchedule {
    pub fn new(policy: RetryPolicy) -> Self {
        let current_delay = policy.initial_delay;
        Self {
            policy,
            attempt: 0,
            current_delay,
        }
    }

    /// Advance after a failure. The rate-limit floor raises this attempt's
    /// wait only; the compounding series itself is untouched.
    pub fn on_failure(&mut self, rate_limited: bool) -> NextAttempt {
        if self.attempt >= self.policy.max_retries {
            return NextAttempt::GiveUp;
        }

        let mut delay = self.current_delay;
        if rate_limited && delay < self.policy.rate_limit_floor {
            delay = self.policy.rate_limit_floor;
        }

        self.current_delay = self.current_delay.mul_f64(self.policy.backoff_factor);
        self.attempt += 1;
        NextAttempt::Retry {
            attempt: self.attempt,
            delay,
        }
    }
}

/// Condenses post bodies through a generative model while guaranteeing a
/// result: exhausted retries degrade to local truncation.
pub struct Summarizer<M> {
    model: M,
    policy: RetryPolicy,
}

impl<M: GenerativeModel> Summarizer<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Condense `text` to roughly `max_chars` characters. Text already
    /// within budget comes back untouched without a model call.
    pub async fn summarize(&self, text: &str, max_chars: usize) -> String {
        if text.is_empty() || text.chars().count() <= max_chars {
            return text.to_string();
        }

        let prompt = build_prompt(text, max_chars);
        let mut schedule = RetrySchedule::new(self.policy.clone());

        loop {
            let outcome = match self.model.generate(&prompt).await {
                Ok(summary) if summary.trim().is_empty() => Err(CoreError::Llm(
                    LlmError::EmptyCompletion {
                        details: "model returned blank summary text".to_string(),
                    },
                )),
                other => other,
            };

            match outcome {
                Ok(summary) => {
                    debug!(
                        "Generated summary of {} chars (budget {})",
                        summary.chars().count(),
                        max_chars
                    );
                    return polish_summary(summary, text, max_chars);
                }
                Err(error) => {
                    warn!("Summary generation failed: {}", error);
                    match schedule.on_failure(error.is_rate_limited()) {
                        NextAttempt::Retry { attempt, delay } => {
                            // A server-provided retry hint can only lengthen
                            // the wait, never shorten it.
                            let wait = error.retry_after().map_or(delay, |hint| delay.max(hint));
                            info!(
                                "Retrying summary generation (attempt {}/{}) after {:?}",
                                attempt, self.policy.max_retries, wait
                            );
                            sleep(wait).await;
                        }
                        NextAttempt::GiveUp => {
                            warn!(
                                "Summarization failed after {} attempts, falling back to truncation",
                                self.policy.max_retries + 1
                            );
                            return truncate_with_ellipsis(text, max_chars);
                        }
                    }
                }
            }
        }
    }
}

fn build_prompt(text: &str, max_chars: usize) -> String {
    format!(
        "Summarize the following Reddit AITA (Am I the Asshole) post. Focus on the main \
         conflict, the actions taken by the original poster (OP), and the question being asked. \
         Keep the summary concise and strictly under {max_chars} characters. Do not add any \
         preamble like \"Here is a summary:\". Just provide the summary text itself.\n\
         \n\
         Post Text:\n\
         ---\n\
         {text}\n\
         ---\n\
         \n\
         Summary (under {max_chars} characters):"
    )
}

/// First `max_chars` characters of `text`, never splitting a scalar value.
fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Local fallback: the leading `max_chars` characters plus an ellipsis
/// marker when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let prefix = char_prefix(text, max_chars);
    if prefix.len() == text.len() {
        text.to_string()
    } else {
        format!("{}...", prefix)
    }
}

/// Enforce the budget on model output. Oversized summaries are cut, at the
/// last space when it falls in the final fifth of the budget. A summary
/// shorter than the source gains a trailing ellipsis unless it already
/// carries one.
fn polish_summary(summary: String, original: &str, max_chars: usize) -> String {
    let summary_chars = summary.chars().count();

    if summary_chars > max_chars {
        warn!(
            "Summary exceeded the {}-char budget ({}), trimming",
            max_chars, summary_chars
        );
        let cut = char_prefix(&summary, max_chars);
        return match cut.rfind(' ') {
            Some(space) if cut[..space].chars().count() as f64 >= max_chars as f64 * 0.8 => {
                format!("{}...", &cut[..space])
            }
            _ => format!("{}...", cut),
        };
    }

    if summary_chars < original.chars().count() && !summary.ends_with("...") {
        return format!("{}...", summary);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct FailingModel {
        calls: Arc<Mutex<usize>>,
    }

    impl GenerativeModel for FailingModel {
        async fn generate(&self, _prompt: &str) -> Result<String, CoreError> {
            *self.calls.lock().unwrap() += 1;
            Err(LlmError::ServiceUnavailable {
                provider: "mock".to_string(),
            }
            .into())
        }
    }

    struct ScriptedModel {
        responses: Mutex<VecDeque<Result<String, CoreError>>>,
        calls: Arc<Mutex<usize>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<String, CoreError>>, calls: Arc<Mutex<usize>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls,
            }
        }
    }

    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, _prompt: &str) -> Result<String, CoreError> {
            *self.calls.lock().unwrap() += 1;
            self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(LlmError::ServiceUnavailable {
                    provider: "mock".to_string(),
                }
                .into())
            })
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            backoff_factor: 2.0,
            rate_limit_floor: Duration::from_millis(1),
        }
    }

    fn service_error() -> CoreError {
        LlmError::ServiceUnavailable {
            provider: "mock".to_string(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_short_text_skips_the_model() {
        let calls = Arc::new(Mutex::new(0));
        let model = FailingModel {
            calls: calls.clone(),
        };
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        let text = "Short enough already.";
        assert_eq!(summarizer.summarize(text, 800).await, text);
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_skips_the_model() {
        let calls = Arc::new(Mutex::new(0));
        let model = FailingModel {
            calls: calls.clone(),
        };
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        assert_eq!(summarizer.summarize("", 800).await, "");
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_successful_summary_gains_ellipsis() {
        let calls = Arc::new(Mutex::new(0));
        let model = ScriptedModel::new(
            vec![Ok("OP bailed on the wedding for an exam".to_string())],
            calls.clone(),
        );
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        let text = "x".repeat(900);
        let summary = summarizer.summarize(&text, 800).await;
        assert_eq!(summary, "OP bailed on the wedding for an exam...");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_existing_ellipsis_is_not_doubled() {
        let calls = Arc::new(Mutex::new(0));
        let model = ScriptedModel::new(
            vec![Ok("The family is still arguing...".to_string())],
            calls.clone(),
        );
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        let text = "x".repeat(900);
        let summary = summarizer.summarize(&text, 800).await;
        assert_eq!(summary, "The family is still arguing...");
    }

    #[tokio::test]
    async fn test_oversized_summary_is_cut_at_a_late_space() {
        // 24 five-char words: 120 chars. The 100-char prefix ends right
        // after the 20th word; the last space sits at index 99, so the cut
        // lands on a word boundary past 80% of the budget.
        let calls = Arc::new(Mutex::new(0));
        let long_summary = "word ".repeat(24);
        let model = ScriptedModel::new(vec![Ok(long_summary)], calls.clone());
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        let text = "y".repeat(300);
        let summary = summarizer.summarize(&text, 100).await;

        let mut expected = "word ".repeat(19);
        expected.push_str("word...");
        assert_eq!(summary, expected);
    }

    #[tokio::test]
    async fn test_oversized_summary_hard_cuts_without_a_late_space() {
        // The only space sits at index 4, far before 80% of the budget, so
        // the cut is a plain character slice.
        let calls = Arc::new(Mutex::new(0));
        let long_summary = format!("lead {}", "z".repeat(120));
        let model = ScriptedModel::new(vec![Ok(long_summary.clone())], calls.clone());
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        let text = "y".repeat(300);
        let summary = summarizer.summarize(&text, 100).await;
        assert_eq!(summary, format!("{}...", &long_summary[..100]));
    }

    #[tokio::test]
    async fn test_failures_fall_back_to_truncation() {
        let calls = Arc::new(Mutex::new(0));
        let model = FailingModel {
            calls: calls.clone(),
        };
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        let text = "a".repeat(150);
        let summary = summarizer.summarize(&text, 100).await;
        assert_eq!(summary, format!("{}...", "a".repeat(100)));
        // Initial attempt plus three retries.
        assert_eq!(*calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_blank_completions_are_retried_then_fall_back() {
        let calls = Arc::new(Mutex::new(0));
        let model = ScriptedModel::new(
            vec![
                Ok("   ".to_string()),
                Ok(String::new()),
                Ok("\n\n".to_string()),
                Ok("\t".to_string()),
            ],
            calls.clone(),
        );
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        let text = "b".repeat(150);
        let summary = summarizer.summarize(&text, 100).await;
        assert_eq!(summary, format!("{}...", "b".repeat(100)));
        assert_eq!(*calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_recovery_after_transient_failures() {
        let calls = Arc::new(Mutex::new(0));
        let model = ScriptedModel::new(
            vec![
                Err(service_error()),
                Err(service_error()),
                Ok("Made it on the third try".to_string()),
            ],
            calls.clone(),
        );
        let summarizer = Summarizer::new(model).with_policy(fast_policy());

        let text = "c".repeat(150);
        let summary = summarizer.summarize(&text, 100).await;
        assert_eq!(summary, "Made it on the third try...");
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[test]
    fn test_backoff_schedule_doubles() {
        let mut schedule = RetrySchedule::new(RetryPolicy::default());
        assert_eq!(
            schedule.on_failure(false),
            NextAttempt::Retry {
                attempt: 1,
                delay: Duration::from_secs(1)
            }
        );
        assert_eq!(
            schedule.on_failure(false),
            NextAttempt::Retry {
                attempt: 2,
                delay: Duration::from_secs(2)
            }
        );
        assert_eq!(
            schedule.on_failure(false),
            NextAttempt::Retry {
                attempt: 3,
                delay: Duration::from_secs(4)
            }
        );
        assert_eq!(schedule.on_failure(false), NextAttempt::GiveUp);
    }

    #[test]
    fn test_rate_limit_floor_raises_the_wait_only() {
        let mut schedule = RetrySchedule::new(RetryPolicy::default());

        // First failure is rate limited: 1s would be due, the floor makes it 5s.
        assert_eq!(
            schedule.on_failure(true),
            NextAttempt::Retry {
                attempt: 1,
                delay: Duration::from_secs(5)
            }
        );
        // The compounding series carries on from 1s regardless.
        assert_eq!(
            schedule.on_failure(false),
            NextAttempt::Retry {
                attempt: 2,
                delay: Duration::from_secs(2)
            }
        );
    }

    #[test]
    fn test_rate_limit_floor_keeps_larger_delays() {
        let policy = RetryPolicy {
            max_retries: 5,
            ..RetryPolicy::default()
        };
        let mut schedule = RetrySchedule::new(policy);
        schedule.on_failure(false); // 1s
        schedule.on_failure(false); // 2s
        schedule.on_failure(false); // 4s

        // Current delay is 8s, already past the 5s floor.
        assert_eq!(
            schedule.on_failure(true),
            NextAttempt::Retry {
                attempt: 4,
                delay: Duration::from_secs(8)
            }
        );
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("abcdef", 4), "abcd...");
        assert_eq!(truncate_with_ellipsis("abc", 4), "abc");
        assert_eq!(truncate_with_ellipsis("abcd", 4), "abcd");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // Three two-byte characters survive a three-char budget intact.
        assert_eq!(truncate_with_ellipsis("ßßßßßß", 3), "ßßß...");
        assert_eq!(truncate_with_ellipsis("déjà vu encore", 4), "déjà...");
    }

    #[test]
    fn test_prompt_names_the_budget() {
        let prompt = build_prompt("body text", 800);
        assert!(prompt.contains("strictly under 800 characters"));
        assert!(prompt.contains("body text"));
        assert!(prompt.contains("main conflict"));
    }
}
