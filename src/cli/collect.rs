//! `collect` subcommand

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::api::client::ApiClientConfig;
use crate::collector::{Collector, CollectorConfig, CollectorStats};
use crate::shutdown::ShutdownCoordinator;

/// Arguments for the `collect` subcommand.
#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Collect every chapter (the default when no selection is given)
    #[arg(long, conflicts_with_all = ["chapter", "chapter_range"])]
    pub all: bool,

    /// Collect a single chapter
    #[arg(long, conflicts_with = "chapter_range")]
    pub chapter: Option<u32>,

    /// Collect an inclusive chapter range, e.g. 2-5
    #[arg(long, value_name = "START-END")]
    pub chapter_range: Option<String>,

    /// Output JSONL file
    #[arg(short, long, default_value = "quran_data.jsonl")]
    pub output: PathBuf,

    /// Error report file (default: collection_errors.json beside the output)
    #[arg(long)]
    pub error_file: Option<PathBuf>,

    /// Translation resource ids, comma separated
    #[arg(long, value_delimiter = ',', default_value = "131")]
    pub translations: Vec<u32>,

    /// Tafsir resource ids, comma separated
    #[arg(long, value_delimiter = ',')]
    pub tafsirs: Vec<u32>,

    /// Records buffered before each write
    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    /// Concurrent tafsir requests (bounded by the live API ceiling)
    #[arg(long, default_value_t = 3)]
    pub concurrency: usize,

    /// Minimum delay between API requests, in milliseconds
    #[arg(long, default_value_t = 300)]
    pub rate_limit_delay_ms: u64,

    /// Consecutive 429s that trip the circuit breaker
    #[arg(long, default_value_t = 5)]
    pub failure_threshold: u32,

    /// Circuit breaker cooldown, in seconds
    #[arg(long, default_value_t = 60)]
    pub cooldown_secs: u64,

    /// Give up after this many 429 retries per request (default: retry
    /// indefinitely)
    #[arg(long)]
    pub max_rate_limit_retries: Option<u32>,

    /// Skip chapters already complete in the output file instead of
    /// starting fresh
    #[arg(long)]
    pub resume: bool,

    /// Omit the per-verse positional metadata
    #[arg(long)]
    pub no_metadata: bool,

    /// API base URL
    #[arg(long, default_value = "https://api.quran.com/api/v4")]
    pub base_url: String,
}

impl CollectArgs {
    fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            output_file: self.output.clone(),
            error_file: self.error_file.clone(),
            translations: self.translations.clone(),
            tafsirs: self.tafsirs.clone(),
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            resume: self.resume,
            include_metadata: !self.no_metadata,
            api: ApiClientConfig {
                base_url: self.base_url.clone(),
                request_delay: Duration::from_millis(self.rate_limit_delay_ms),
                concurrency: self.concurrency,
                failure_threshold: self.failure_threshold,
                cooldown: Duration::from_secs(self.cooldown_secs),
                max_rate_limit_retries: self.max_rate_limit_retries,
                ..ApiClientConfig::default()
            },
        }
    }
}

/// Parse an inclusive "START-END" chapter range.
fn parse_range(range: &str) -> Result<(u32, u32)> {
    let (start, end) = range
        .split_once('-')
        .with_context(|| format!("invalid range '{range}': expected START-END"))?;
    let start: u32 = start
        .trim()
        .parse()
        .with_context(|| format!("invalid range start '{start}'"))?;
    let end: u32 = end
        .trim()
        .parse()
        .with_context(|| format!("invalid range end '{end}'"))?;
    if start == 0 || start > end {
        bail!("invalid range '{range}': start must be >= 1 and <= end");
    }
    Ok((start, end))
}

/// Run the collect subcommand.
pub async fn run(args: CollectArgs, shutdown: Arc<ShutdownCoordinator>) -> Result<()> {
    let config = args.collector_config();
    let output = config.output_file.clone();
    let mut collector = Collector::new(config)
        .context("failed to initialize collector")?
        .with_shutdown(shutdown);

    let stats = if let Some(chapter) = args.chapter {
        collector.collect_single(chapter).await?
    } else if let Some(range) = &args.chapter_range {
        let (start, end) = parse_range(range)?;
        collector.collect_range(start, end).await?
    } else {
        collector.collect_all().await?
    };

    print_summary(&stats, &output);
    if stats.interrupted {
        bail!("collection interrupted; re-run with --resume to pick up where it stopped");
    }
    Ok(())
}

fn print_summary(stats: &CollectorStats, output: &std::path::Path) {
    println!("Collection summary");
    println!("  output:             {}", output.display());
    println!("  chapters processed: {}", stats.chapters_processed);
    println!("  chapters skipped:   {}", stats.chapters_skipped);
    println!("  verses collected:   {}", stats.verses_collected);
    if stats.tafsirs_attempted > 0 {
        println!(
            "  tafsirs:            {} fetched, {} missing, {} failed",
            stats.tafsirs_fetched, stats.tafsirs_missing, stats.tafsirs_failed
        );
    }
    if !stats.errors.is_empty() {
        println!("  errors recorded:    {}", stats.errors.len());
    }
}
