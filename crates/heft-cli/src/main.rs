use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use heft_core::{Notifier, OutcomeError, Queue, QueueConfig, QueueError, QueueStats, TaskParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Push a random weighted workload through a queue and report what happened.
#[derive(Debug, Parser)]
#[command(name = "heft", version)]
struct Args {
    /// Queue config as JSON (`{"weight_limit": 10, "autostart": false}`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the config's weight limit.
    #[arg(long)]
    weight_limit: Option<u32>,

    #[arg(long, default_value_t = 20)]
    tasks: usize,

    /// Weights are drawn from 1..=max_weight; anything above the limit is rejected.
    #[arg(long, default_value_t = 5)]
    max_weight: u32,

    /// Priorities are drawn from 0..=max_priority.
    #[arg(long, default_value_t = 3)]
    max_priority: i32,

    /// Mean simulated work time per task.
    #[arg(long, default_value_t = 50)]
    work_ms: u64,

    /// Chance that a task fails.
    #[arg(long, default_value_t = 0.1)]
    failure_rate: f64,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    fulfilled: usize,
    failed: usize,
    abandoned: usize,
    rejected: usize,
    elapsed_ms: u128,
    stats: QueueStats,
}

/// One simulated unit of work: sleeps, reports halfway, maybe fails.
async fn simulate(
    index: usize,
    duration: Duration,
    fail: bool,
    progress: Notifier<String>,
) -> Result<usize, String> {
    tokio::time::sleep(duration / 2).await;
    progress.notify(format!("task #{index} halfway"));
    tokio::time::sleep(duration - duration / 2).await;
    if fail {
        return Err(format!("task #{index} failed"));
    }
    Ok(index)
}

fn load_config(args: &Args) -> Result<QueueConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => QueueConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => QueueConfig::default(),
    };
    if let Some(limit) = args.weight_limit {
        config.weight_limit = limit;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let queue = Queue::new(config)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut summary = Summary::default();
    let mut joins = Vec::with_capacity(args.tasks);
    for index in 0..args.tasks {
        let params = TaskParams::default()
            .with_weight(rng.gen_range(1..=args.max_weight.max(1)))
            .with_priority(rng.gen_range(0..=args.max_priority.max(0)));
        let millis = rng.gen_range(args.work_ms / 2..=args.work_ms + args.work_ms / 2);
        let fail = rng.gen_bool(args.failure_rate.clamp(0.0, 1.0));

        let outcome = match queue.enqueue_with_progress(
            move |progress| simulate(index, Duration::from_millis(millis), fail, progress),
            params,
        ) {
            Ok(outcome) => outcome,
            Err(err @ QueueError::WeightExceedsLimit { .. }) => {
                warn!(index, "{err}");
                summary.rejected += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        joins.push(tokio::spawn(async move {
            let mut outcome = outcome;
            while let Some(message) = outcome.progress().await {
                info!(task = %outcome.id(), "{message}");
            }
            outcome.await
        }));
    }

    info!(stats = ?queue.stats(), "workload enqueued");
    let started_at = Instant::now();
    queue.start();

    let reporter = {
        let queue = queue.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(100));
            loop {
                tick.tick().await;
                let stats = queue.stats();
                info!(
                    pending = stats.pending,
                    processing = stats.processing,
                    processed = stats.processed,
                    weight_in_use = stats.weight_in_use,
                    "queue"
                );
            }
        })
    };

    for join in joins {
        match join.await? {
            Ok(_) => summary.fulfilled += 1,
            Err(OutcomeError::Failed(err)) => {
                warn!("{err}");
                summary.failed += 1;
            }
            Err(OutcomeError::Abandoned) => summary.abandoned += 1,
        }
    }
    reporter.abort();

    summary.elapsed_ms = started_at.elapsed().as_millis();
    summary.stats = queue.stats();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
