use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use callsite::{
    config::{BenchConfig, PhaseConfig},
    harness::Harness,
    policy::Population,
    receiver::ReceiverPool,
    report::{render_table, ReportWriter, TimeUnit},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Callsite dispatch benchmarks")]
struct Cli {
    /// Path to a benchmark YAML file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Benchmarks to run (all when omitted)
    #[arg(long = "bench", value_enum)]
    benches: Vec<Population>,

    /// Override the number of forks
    #[arg(long)]
    forks: Option<u32>,

    /// Override the number of threads per fork
    #[arg(long)]
    threads: Option<u32>,

    /// Override the warmup iteration count
    #[arg(long)]
    warmup_iterations: Option<u32>,

    /// Override the measurement iteration count
    #[arg(long)]
    measurement_iterations: Option<u32>,

    /// Override the time budget of every warmup and measurement iteration
    #[arg(long)]
    iteration_time_ms: Option<u64>,

    /// Override the passes over the receiver array per operation
    #[arg(long)]
    loop_times: Option<u64>,

    /// Master seed for receiver selection
    #[arg(long)]
    seed: Option<u64>,

    /// Unit throughput is reported in
    #[arg(long, value_enum)]
    time_unit: Option<TimeUnit>,

    /// Directory for JSON reports
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut BenchConfig) {
        if let Some(forks) = self.forks {
            config.forks = forks;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(iterations) = self.warmup_iterations {
            config.warmup.iterations = iterations;
        }
        if let Some(iterations) = self.measurement_iterations {
            config.measurement.iterations = iterations;
        }
        if let Some(time_ms) = self.iteration_time_ms {
            config.warmup = PhaseConfig::new(config.warmup.iterations, time_ms);
            config.measurement = PhaseConfig::new(config.measurement.iterations, time_ms);
        }
        if let Some(loop_times) = self.loop_times {
            config.loop_times = loop_times;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(unit) = self.time_unit {
            config.time_unit = unit;
        }
        if self.report_dir.is_some() {
            config.report.output_dir = self.report_dir.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => BenchConfig::from_yaml(path)
            .with_context(|| format!("Failed to load benchmark config {}", path.display()))?,
        None => BenchConfig::default(),
    };
    cli.apply(&mut config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let benches = if cli.benches.is_empty() {
        Population::ALL.to_vec()
    } else {
        cli.benches.clone()
    };

    let pool = ReceiverPool::standard();
    let harness = Harness::new(&pool, config).context("Invalid benchmark settings")?;
    let reports = harness.run_all(&benches);

    if let Some(dir) = &harness.config().report.output_dir {
        let writer = ReportWriter::new(dir)
            .with_context(|| format!("Failed to create report dir {}", dir.display()))?;
        for report in &reports {
            let path = writer
                .write(report)
                .with_context(|| format!("Failed to write report for {}", report.benchmark))?;
            tracing::info!(path = %path.display(), "report written");
        }
    }

    print!("{}", render_table(&reports));
    println!("Seed: {}", harness.seed());
    Ok(())
}
