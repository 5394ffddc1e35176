//! Receiver population policies

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How often a benchmark state rebuilds its receiver array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refresh {
    /// Once per trial: the callsite sees the same mix for the whole run.
    Trial,
    /// Before every warmup and measurement iteration.
    Iteration,
}

/// Number of distinct receiver types one callsite observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    /// Every slot is the first pool receiver.
    Mono,
    /// Slots drawn uniformly from the first three pool receivers.
    Poly,
    /// Slots drawn uniformly from the first eight pool receivers.
    Mega,
}

impl Population {
    pub const ALL: [Population; 3] = [Population::Mono, Population::Poly, Population::Mega];

    /// Upper bound on distinct receiver types appearing in one array.
    pub fn distinct_bound(self) -> usize {
        match self {
            Population::Mono => 1,
            Population::Poly => 3,
            Population::Mega => 8,
        }
    }

    pub fn refresh(self) -> Refresh {
        match self {
            Population::Mono => Refresh::Trial,
            Population::Poly | Population::Mega => Refresh::Iteration,
        }
    }

    pub fn benchmark_name(self) -> &'static str {
        match self {
            Population::Mono => "dispatch_monomorphic",
            Population::Poly => "dispatch_polymorphic",
            Population::Mega => "dispatch_megamorphic",
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.benchmark_name())
    }
}
