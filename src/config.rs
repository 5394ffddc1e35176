//! Benchmark configuration

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::{LOOP_TIMES, RECEIVER_COUNT};
use crate::error::{BenchError, Result};
use crate::report::TimeUnit;

fn default_name() -> String {
    "callsite".to_string()
}

fn default_array_len() -> usize {
    RECEIVER_COUNT
}

fn default_loop_times() -> u64 {
    LOOP_TIMES
}

fn default_forks() -> u32 {
    3
}

fn default_threads() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings for one benchmark run. Every field falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Master seed for the receiver streams; drawn at random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_array_len")]
    pub array_len: usize,
    #[serde(default = "default_loop_times")]
    pub loop_times: u64,
    #[serde(default = "default_forks")]
    pub forks: u32,
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default)]
    pub warmup: PhaseConfig,
    #[serde(default)]
    pub measurement: PhaseConfig,
    #[serde(default)]
    pub time_unit: TimeUnit,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Iteration schedule for a warmup or measurement phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub iterations: u32,
    pub time_ms: u64,
}

impl PhaseConfig {
    pub fn new(iterations: u32, time_ms: u64) -> Self {
        Self {
            iterations,
            time_ms,
        }
    }

    pub fn time(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self::new(5, 2_000)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory receiving one JSON report per benchmark.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            seed: None,
            array_len: default_array_len(),
            loop_times: default_loop_times(),
            forks: default_forks(),
            threads: default_threads(),
            warmup: PhaseConfig::default(),
            measurement: PhaseConfig::default(),
            time_unit: TimeUnit::default(),
            logging: LoggingConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: BenchConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Small, fast settings for tests and smoke runs.
    pub fn quick() -> Self {
        Self {
            seed: Some(42),
            loop_times: 1_000,
            forks: 1,
            warmup: PhaseConfig::new(1, 10),
            measurement: PhaseConfig::new(2, 10),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.array_len == 0 {
            return Err(invalid("array_len must be greater than zero"));
        }
        if self.loop_times == 0 {
            return Err(invalid("loop_times must be greater than zero"));
        }
        if self.forks == 0 {
            return Err(invalid("forks must be greater than zero"));
        }
        if self.threads == 0 {
            return Err(invalid("threads must be greater than zero"));
        }
        if self.measurement.iterations == 0 {
            return Err(invalid("measurement.iterations must be greater than zero"));
        }
        if self.measurement.time_ms == 0 {
            return Err(invalid("measurement.time_ms must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> BenchError {
    BenchError::Config(msg.to_string())
}
