use clap::Parser;
use reddit_client::{RedditClient, RedditClientConfig, RetryPolicy, MAX_FULLNAMES_PER_LOOKUP};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use vote_processor::{
    PostWriter, ProcessSummary, ProcessorSettings, ScanProgress, VoteProcessor, VoteScanner,
};
use votelens_core::{ApiConfig, CoreError, ErrorReporter};

const DEFAULT_LOG_FILTER: &str = "votelens=info,reddit_client=info,vote_processor=info";

/// Enrich a CSV of Reddit votes with the subreddit, title and text of each post.
#[derive(Parser, Debug)]
#[command(name = "votelens", version, about)]
struct Cli {
    /// Byte offset in the votes file to start processing at
    #[arg(short, long, default_value_t = 0)]
    start: u64,

    /// Number of posts looked up per request
    #[arg(
        short,
        long,
        default_value_t = 25,
        value_parser = clap::value_parser!(u16).range(1..=MAX_FULLNAMES_PER_LOOKUP as i64)
    )]
    batch: u16,

    /// YAML file with the Reddit API credentials
    #[arg(long, default_value = "auth.yaml")]
    config: PathBuf,

    /// CSV of `username,fullname,vote` rows
    #[arg(long, default_value = "votes.csv")]
    input: PathBuf,

    /// CSV the enriched rows are appended to
    #[arg(long, default_value = "processed.csv")]
    output: PathBuf,

    /// Pause after each batch, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pause_ms: u64,

    /// Pause before retrying a failed lookup, in milliseconds
    #[arg(long, default_value_t = 5000)]
    retry_delay_ms: u64,

    /// Retries allowed for a failed lookup before its batch is dropped
    #[arg(long, default_value_t = 5)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting votelens");

    run(cli).await.map_err(|e| {
        ErrorReporter::new().report_error(&e);
        e
    })
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let credentials = ApiConfig::load(&cli.config)?;
    tracing::info!("Using credentials {:?}", credentials);

    let client_config = RedditClientConfig::new(credentials.user_agent()).with_retry(RetryPolicy {
        max_retries: cli.max_retries,
        delay: Duration::from_millis(cli.retry_delay_ms),
    });
    let mut client = RedditClient::new(&credentials, client_config)?;
    client.authenticate().await?;

    let mut scanner = VoteScanner::open(&cli.input, cli.start)?;
    let mut writer = PostWriter::append(&cli.output)?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let resume = ScanProgress::default();
    spawn_interrupt_listener(stop_tx, resume.clone());

    let settings = ProcessorSettings {
        batch_size: usize::from(cli.batch),
        batch_pause: Duration::from_millis(cli.pause_ms),
    };
    let mut processor = VoteProcessor::new(client, settings)
        .with_stop_signal(stop_rx)
        .with_resume_progress(resume.clone());

    match processor.run(&mut scanner, &mut writer).await {
        Ok(summary) => {
            report(&summary);
            Ok(())
        }
        Err(e) => {
            println!("Stopped at position: {}", resume.get());
            Err(e)
        }
    }
}

/// First Ctrl-C stops the loop at the next record; a second one exits at once,
/// printing the offset after the last dispatched batch.
fn spawn_interrupt_listener(stop: watch::Sender<bool>, resume: ScanProgress) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_err() {
            tracing::warn!("Could not listen for Ctrl-C; interrupting will lose the position");
            return;
        }
        tracing::warn!("Interrupt received, stopping after the current batch");
        // The processor may already be done and have dropped its receiver.
        let _ = stop.send(true);

        if signal::ctrl_c().await.is_ok() {
            println!("Interrupted again, exiting immediately");
            println!("Stopped at position: {}", resume.get());
            std::process::exit(130);
        }
    });
}

fn report(summary: &ProcessSummary) {
    if summary.interrupted {
        println!("Interrupted file processing");
        println!("==========================");
    }
    println!("Stopped at position: {}", summary.resume_position);
    if summary.scanned_position != summary.resume_position {
        println!(
            "Last scanned position: {} (rows after {} were not looked up)",
            summary.scanned_position, summary.resume_position
        );
    }
    println!(
        "{} rows written, {} records read, {} skipped, {} dropped in {} failed batches",
        summary.rows_written,
        summary.records_read,
        summary.records_skipped,
        summary.records_dropped,
        summary.batches_dropped
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_layout() {
        let cli = Cli::parse_from(["votelens"]);
        assert_eq!(cli.start, 0);
        assert_eq!(cli.batch, 25);
        assert_eq!(cli.config, PathBuf::from("auth.yaml"));
        assert_eq!(cli.input, PathBuf::from("votes.csv"));
        assert_eq!(cli.output, PathBuf::from("processed.csv"));
    }

    #[test]
    fn test_start_and_batch_flags() {
        let cli = Cli::parse_from(["votelens", "--start", "1024", "-b", "50"]);
        assert_eq!(cli.start, 1024);
        assert_eq!(cli.batch, 50);
    }

    #[test]
    fn test_batch_above_lookup_limit_is_rejected() {
        assert!(Cli::try_parse_from(["votelens", "--batch", "101"]).is_err());
        assert!(Cli::try_parse_from(["votelens", "--batch", "0"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
