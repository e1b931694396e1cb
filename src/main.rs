//! CLI entry point for the transit feed ingester.
//!
//! Provides subcommands for ingesting channels, validating stored raw
//! feeds, and inspecting or pruning the snapshot store.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_feed_ingest::{
    canonical::canonicalize,
    config::{IngestConfig, retention_from_days},
    fetch::BasicClient,
    output::{log_statistics, log_validation, print_json},
    parser::parse_feed,
    pipeline::Ingestor,
    router::Channel,
    store::{FileKind, SnapshotStore, StoredFile},
    validation::{FreshnessPolicy, coverage, statistics, validate},
};

#[derive(Parser)]
#[command(name = "transit_feed_ingest")]
#[command(about = "Ingest, validate and store GTFS-realtime feed snapshots", long_about = None)]
struct Cli {
    /// Root directory of the snapshot store (overrides INGEST_DATA_DIR)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Freshness policy: legacy or strict (overrides INGEST_FRESHNESS_POLICY)
    #[arg(long, global = true)]
    freshness: Option<FreshnessPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, validate and store the feeds carrying the given lines
    Ingest {
        /// Subway lines, comma separated (e.g. "A,C,L")
        #[arg(short, long, value_delimiter = ',', required_unless_present = "all")]
        lines: Vec<String>,

        /// Ingest every channel in the line table
        #[arg(long, conflicts_with = "lines")]
        all: bool,

        /// Do not keep the raw protobuf bytes
        #[arg(long, default_value_t = false)]
        no_raw: bool,
    },
    /// Decode and validate a stored raw feed file
    Validate {
        /// Path to a .pb file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Channel the file belongs to (defaults to the file name prefix)
        #[arg(short, long)]
        channel: Option<String>,
    },
    /// Show the most recent stored file for a channel
    Latest {
        channel: String,

        /// raw, parsed or samples
        #[arg(short, long, default_value = "parsed")]
        kind: FileKind,
    },
    /// List stored files
    List {
        /// raw, parsed or samples (all when omitted)
        #[arg(short, long)]
        kind: Option<FileKind>,
    },
    /// Check that the latest snapshot of a channel covers the given routes
    Coverage {
        channel: String,

        /// Expected routes, comma separated (defaults to the channel's lines)
        #[arg(short, long, value_delimiter = ',')]
        routes: Vec<String>,
    },
    /// Copy the latest snapshot of a channel into samples/
    Sample {
        channel: String,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete stored files older than the retention window
    Prune {
        /// Days to keep (overrides INGEST_RETENTION_DAYS)
        #[arg(long)]
        days: Option<u64>,
    },
    /// Summarize the store contents
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/transit_feed_ingest.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_feed_ingest.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = IngestConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(policy) = cli.freshness {
        config.freshness = policy;
    }

    let router = config.router()?;
    let store = SnapshotStore::open(&config.data_dir)?;

    match cli.command {
        Commands::Ingest { lines, all, no_raw } => {
            let ingestor = Ingestor::new(BasicClient::new(), &router, store)
                .with_validator(config.validator())
                .with_timeout(config.fetch_timeout)
                .with_raw_persistence(!no_raw);

            let reports = if all {
                ingestor.ingest_all().await
            } else {
                ingestor.ingest_lines(&lines).await?
            };

            for (channel, report) in &reports {
                info!(
                    channel = %channel,
                    is_valid = report.validation.is_valid,
                    parsed = ?report.parsed_path,
                    "Channel ingested"
                );
            }
        }
        Commands::Validate { file, channel } => {
            let channel = match channel {
                Some(channel) => channel,
                None => StoredFile::parse(FileKind::Raw, &file)
                    .map(|f| f.channel)
                    .context("cannot infer channel from file name, pass --channel")?,
            };
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let feed = parse_feed(&bytes)?;
            let snapshot = canonicalize(&channel, &feed, Utc::now());

            let result = validate(&snapshot, &config.validator());
            log_validation(&channel, &result);
            log_statistics(&channel, &statistics(&snapshot));
            print_json(&result)?;
        }
        Commands::Latest { channel, kind } => match store.latest(&channel, kind) {
            Some(path) => {
                info!(channel = %channel, kind = %kind, path = %path.display(), "Latest file");
                if kind == FileKind::Parsed {
                    if let Some(snapshot) = store.load_canonical(&path) {
                        log_validation(&channel, &validate(&snapshot, &config.validator()));
                        log_statistics(&channel, &statistics(&snapshot));
                    }
                }
            }
            None => warn!(channel = %channel, kind = %kind, "No stored file"),
        },
        Commands::List { kind } => {
            print_json(&store.list(kind))?;
        }
        Commands::Coverage { channel, routes } => {
            let routes = if routes.is_empty() {
                let parsed: Channel = channel.parse()?;
                router
                    .lines_for(parsed)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            } else {
                routes
            };
            let Some(snapshot) = store.latest_snapshot(&channel) else {
                bail!("no stored snapshot for channel {channel}");
            };
            let result = coverage(&snapshot, &routes);
            if !result.complete {
                warn!(channel = %channel, missing = ?result.missing, "Routes missing from feed");
            }
            print_json(&result)?;
        }
        Commands::Sample {
            channel,
            description,
        } => {
            let Some(snapshot) = store.latest_snapshot(&channel) else {
                bail!("no stored snapshot for channel {channel}");
            };
            let path = store.persist_sample(&channel, &snapshot, description.as_deref())?;
            info!(path = %path.display(), "Sample saved");
        }
        Commands::Prune { days } => {
            let max_age = match days {
                Some(days) => retention_from_days(days)?,
                None => config.retention,
            };
            let report = store.prune(max_age);
            info!(
                removed = report.removed.len(),
                failed = report.failed.len(),
                "Prune finished"
            );
        }
        Commands::Summary => {
            print_json(&store.summary())?;
        }
    }

    Ok(())
}
