//! Event consumer entry point.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use consumer_runtime::adapters::FileActivityStore;
use consumer_runtime::{activity_log, build_consumer, consume_lines, health_report, ConsumerConfig};
use consumer_telemetry::{gather_text, init_telemetry, TelemetryConfig};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

/// Campus change-event consumer
#[derive(Parser, Debug)]
#[command(name = "event-consumer")]
#[command(about = "Authenticate, decrypt and dispatch campus change events")]
struct Cli {
    /// File holding activity buckets, shared by concurrent consumers
    #[arg(long, global = true, default_value = "event-activity.json")]
    activity_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest newline-delimited raw envelopes
    Consume {
        /// Input file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Write Prometheus metrics to stderr when done
        #[arg(long)]
        metrics: bool,
    },

    /// Print per-minute event counts
    Health {
        /// Comma-separated categories (enrollment,instructor,person,group)
        #[arg(long = "type", value_name = "CATEGORIES")]
        types: String,

        /// A single minute
        #[arg(long, conflicts_with_all = ["begin", "end"])]
        on: Option<String>,

        /// Window start
        #[arg(long)]
        begin: Option<String>,

        /// Window end, defaults to now
        #[arg(long, requires = "begin")]
        end: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry(&TelemetryConfig::from_env()).context("failed to initialize telemetry")?;
    let config = ConsumerConfig::from_env().context("invalid configuration")?;

    let store = FileActivityStore::open(&cli.activity_file)
        .context("failed to open activity file")?;
    let log = activity_log(&config, Arc::new(store));

    match cli.command {
        Command::Consume { input, metrics } => {
            let consumer = build_consumer(&config, log).context("failed to wire consumer")?;
            let mut stdout = io::stdout();

            let summary = if input == "-" {
                let reader = BufReader::new(tokio::io::stdin());
                consume_lines(&consumer.engine, reader, &mut stdout).await
            } else {
                let file = tokio::fs::File::open(&input)
                    .await
                    .with_context(|| format!("cannot open {input}"))?;
                consume_lines(&consumer.engine, BufReader::new(file), &mut stdout).await
            };

            let summary = summary.context("consume aborted")?;

            info!(
                processed = summary.processed,
                failed = summary.failed,
                updates = consumer.records.updates().len(),
                "consume finished"
            );
            if metrics {
                eprint!("{}", gather_text().context("failed to encode metrics")?);
            }
            if summary.failed > 0 {
                bail!(
                    "{} of {} messages failed",
                    summary.failed,
                    summary.processed + summary.failed
                );
            }
        }
        Command::Health {
            types,
            on,
            begin,
            end,
        } => {
            let report = health_report(
                &log,
                &types,
                on.as_deref(),
                begin.as_deref(),
                end.as_deref(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
