//! Benchmark results and how they are written out

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::BenchConfig;
use crate::error::Result;
use crate::policy::Population;

/// Unit throughput is reported per.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum TimeUnit {
    #[serde(rename = "ns")]
    #[value(name = "ns")]
    Nanoseconds,
    #[serde(rename = "us")]
    #[value(name = "us")]
    Microseconds,
    #[default]
    #[serde(rename = "ms")]
    #[value(name = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    #[value(name = "s")]
    Seconds,
}

impl TimeUnit {
    pub fn label(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ops/ns",
            TimeUnit::Microseconds => "ops/us",
            TimeUnit::Milliseconds => "ops/ms",
            TimeUnit::Seconds => "ops/s",
        }
    }

    fn nanos(self) -> f64 {
        match self {
            TimeUnit::Nanoseconds => 1.0,
            TimeUnit::Microseconds => 1_000.0,
            TimeUnit::Milliseconds => 1_000_000.0,
            TimeUnit::Seconds => 1_000_000_000.0,
        }
    }

    /// Operations per unit for `operations` completed in `elapsed`.
    pub fn throughput(self, operations: u64, elapsed: Duration) -> f64 {
        let nanos = elapsed.as_nanos() as f64;
        if nanos == 0.0 {
            return 0.0;
        }
        operations as f64 * self.nanos() / nanos
    }
}

/// One timed iteration, summed over the fork's threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub iteration: u32,
    pub operations: u64,
    pub dispatches: u64,
    pub elapsed_ms: f64,
    pub throughput: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkResult {
    pub fork: u32,
    pub warmup: Vec<Sample>,
    pub measurement: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub samples: usize,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

impl Summary {
    pub fn from_values(values: &[f64], unit: TimeUnit) -> Self {
        let samples = values.len();
        if samples == 0 {
            return Self {
                samples,
                mean: 0.0,
                stddev: 0.0,
                min: 0.0,
                max: 0.0,
                unit: unit.label().to_string(),
            };
        }

        let mean = values.iter().sum::<f64>() / samples as f64;
        let stddev = if samples > 1 {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (samples - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            samples,
            mean,
            stddev,
            min,
            max,
            unit: unit.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub benchmark: String,
    pub population: Population,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub config: BenchConfig,
    pub forks: Vec<ForkResult>,
    pub summary: Summary,
}

impl BenchmarkReport {
    /// Measurement samples of every fork, in fork order.
    pub fn measured(&self) -> impl Iterator<Item = &Sample> {
        self.forks.iter().flat_map(|fork| fork.measurement.iter())
    }
}

/// Writes one pretty-printed JSON file per benchmark.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn write(&self, report: &BenchmarkReport) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{}.json", report.benchmark));
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn load(&self, benchmark: &str) -> Result<BenchmarkReport> {
        let path = self.output_dir.join(format!("{benchmark}.json"));
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Console summary, one line per benchmark.
pub fn render_table(reports: &[BenchmarkReport]) -> String {
    let name_width = reports
        .iter()
        .map(|r| r.benchmark.len())
        .max()
        .unwrap_or(0)
        .max("Benchmark".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:>5}  {:>3}  {:>12}  {:>10}  {:<6}",
        "Benchmark", "Mode", "Cnt", "Score", "Error", "Units"
    );
    for report in reports {
        let summary = &report.summary;
        let _ = writeln!(
            out,
            "{:<name_width$}  {:>5}  {:>3}  {:>12.3}  {:>10.3}  {:<6}",
            report.benchmark, "thrpt", summary.samples, summary.mean, summary.stddev, summary.unit
        );
    }
    out
}
