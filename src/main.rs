mod cli;
mod output;
mod pipeline;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use digest_core::{Credentials, DigestConfig};
use llm_interface::{GeminiClient, Summarizer};
use reddit_client::RedditApiClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let start_time = std::time::Instant::now();
    let failed = match run().await {
        Ok(()) => false,
        Err(error) => {
            error!("Run aborted: {:?}", error);
            true
        }
    };
    info!("Finished in {:.2?}", start_time.elapsed());

    if failed {
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let mut args = Cli::parse();
    let command = args.command.take();
    let config = args
        .into_config()
        .context("invalid command-line configuration")?;

    match command {
        Some(Command::ListModels) => list_models(&config).await,
        None => run_digest(&config).await,
    }
}

async fn run_digest(config: &DigestConfig) -> anyhow::Result<()> {
    info!(
        "Starting AITA daily digest for r/{} (top {} posts)",
        config.subreddit, config.post_limit
    );

    let credentials = Credentials::from_env().context("missing API credentials")?;

    let mut reddit = RedditApiClient::new(&config.user_agent)?;
    reddit
        .authenticate(
            &credentials.reddit_client_id,
            &credentials.reddit_client_secret,
        )
        .await
        .context("Reddit authentication failed")?;

    let gemini = GeminiClient::new(credentials.google_api_key, config.gemini_model.clone())?;
    let summarizer = Summarizer::new(gemini);

    let records = pipeline::run(config, &reddit, &summarizer).await;
    if records.is_empty() {
        info!("No posts analyzed; skipping the output file");
        return Ok(());
    }

    output::write_batch(&config.output_file, &records)
        .with_context(|| format!("could not write {}", config.output_file.display()))?;
    Ok(())
}

async fn list_models(config: &DigestConfig) -> anyhow::Result<()> {
    let credentials = Credentials::from_env().context("missing API credentials")?;
    let client = GeminiClient::new(credentials.google_api_key, config.gemini_model.clone())?;

    let models = client.list_models().await?;
    println!("{} models available:", models.len());
    for model in &models {
        let marker = if model.supports_generation() { "*" } else { " " };
        println!("{} {} ({})", marker, model.short_name(), model.display_name);
    }
    println!("\n* supports generateContent");
    Ok(())
}
