use BoundedQueueMini::core::config::QueueConfig;
use BoundedQueueMini::core::log::{append_logs, init_tracing};
use BoundedQueueMini::core::pipeline::Pipeline;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Run one producer and one consumer over a bounded queue
#[derive(Debug, Parser)]
#[command(name = "bounded-queue-mini")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    capacity: Option<usize>,

    /// Insertions before the producer is done
    #[arg(long)]
    limit: Option<usize>,

    /// Per-call wait in milliseconds; 0 waits indefinitely
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// NDJSON file the event log is appended to
    #[arg(long, default_value = "output.ndjson")]
    log_path: PathBuf,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match QueueConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => QueueConfig::default(),
    };
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if let Some(limit) = cli.limit {
        config.insert_limit = Some(limit);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = (timeout_ms > 0).then_some(timeout_ms);
    }

    println!("queue capacity: {}", config.capacity);
    let pipeline = match Pipeline::<u64>::new(config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let report = match pipeline.run(1..) {
        Ok(report) => report,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    println!("producer thread returned: {}", report.producer.code);
    println!("consumer thread returned: {}", report.consumer.code);

    if let Err(err) = append_logs(&report.logs, &cli.log_path) {
        error!("failed to append logs to {}: {err}", cli.log_path.display());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
