pub mod gemini;
pub mod summarizer;

pub use gemini::{GeminiClient, ModelInfo};
pub use summarizer::{NextAttempt, RetryPolicy, RetrySchedule, Summarizer};

use digest_core::CoreError;

/// A text-generation backend. Blank and safety-blocked completions are
/// reported as errors so callers see every unusable response the same way.
pub trait GenerativeModel {
    async fn generate(&self, prompt: &str) -> Result<String, CoreError>;
}
