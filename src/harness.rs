//! Manual timing harness
//!
//! Runs a population policy through forks, warmup and measurement
//! iterations. A fork is one trial: every thread of the fork builds a fresh
//! [`DispatchState`] from its own random stream, sets it up once for the
//! trial, then refreshes it before each iteration as its policy dictates.

use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use crate::config::{BenchConfig, PhaseConfig};
use crate::driver::DispatchState;
use crate::error::Result;
use crate::policy::Population;
use crate::receiver::ReceiverPool;
use crate::report::{BenchmarkReport, ForkResult, Sample, Summary, TimeUnit};
use crate::rng::RngManager;
use crate::sink::Blackhole;

/// Work one thread got through in one iteration.
#[derive(Debug, Clone, Copy, Default)]
struct IterationRun {
    operations: u64,
    dispatches: u64,
    elapsed: Duration,
}

#[derive(Debug, Default)]
struct ThreadRuns {
    warmup: Vec<IterationRun>,
    measurement: Vec<IterationRun>,
}

pub struct Harness<'p> {
    pool: &'p ReceiverPool,
    config: BenchConfig,
    rng: RngManager,
}

impl<'p> Harness<'p> {
    pub fn new(pool: &'p ReceiverPool, config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let rng = config
            .seed
            .map(RngManager::new)
            .unwrap_or_else(RngManager::from_entropy);
        Ok(Self { pool, config, rng })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Master seed in use, whether configured or drawn.
    pub fn seed(&self) -> u64 {
        self.rng.master_seed()
    }

    pub fn run_all(&self, populations: &[Population]) -> Vec<BenchmarkReport> {
        populations
            .iter()
            .map(|population| self.run(*population))
            .collect()
    }

    pub fn run(&self, population: Population) -> BenchmarkReport {
        let started_at = Utc::now();
        info!(
            benchmark = population.benchmark_name(),
            seed = self.seed(),
            forks = self.config.forks,
            threads = self.config.threads,
            "benchmark started"
        );

        let forks: Vec<ForkResult> = (0..self.config.forks)
            .map(|fork| self.run_fork(population, fork))
            .collect();

        let values: Vec<f64> = forks
            .iter()
            .flat_map(|fork| fork.measurement.iter().map(|sample| sample.throughput))
            .collect();
        let summary = Summary::from_values(&values, self.config.time_unit);
        info!(
            benchmark = population.benchmark_name(),
            mean = summary.mean,
            stddev = summary.stddev,
            unit = %summary.unit,
            "benchmark finished"
        );

        BenchmarkReport {
            benchmark: population.benchmark_name().to_string(),
            population,
            seed: self.seed(),
            started_at,
            config: self.config.clone(),
            forks,
            summary,
        }
    }

    fn run_fork(&self, population: Population, fork: u32) -> ForkResult {
        debug!(benchmark = population.benchmark_name(), fork = fork + 1, "fork started");
        let threads = self.config.threads;
        let barrier = Barrier::new(threads as usize);

        let runs: Vec<ThreadRuns> = thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|thread| {
                    let barrier = &barrier;
                    scope.spawn(move || self.run_thread(population, fork, thread, barrier))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let unit = self.config.time_unit;
        let warmup = merge_phase(&runs, self.config.warmup, unit, |runs| &runs.warmup);
        let measurement =
            merge_phase(&runs, self.config.measurement, unit, |runs| &runs.measurement);

        for sample in &warmup {
            debug!(
                fork = fork + 1,
                iteration = sample.iteration,
                throughput = sample.throughput,
                "warmup iteration"
            );
        }
        for sample in &measurement {
            info!(
                benchmark = population.benchmark_name(),
                fork = fork + 1,
                iteration = sample.iteration,
                throughput = sample.throughput,
                unit = unit.label(),
                "measurement iteration"
            );
        }

        ForkResult {
            fork,
            warmup,
            measurement,
        }
    }

    fn run_thread(
        &self,
        population: Population,
        fork: u32,
        thread: u32,
        barrier: &Barrier,
    ) -> ThreadRuns {
        let rng = self.rng.stream(population, fork, thread);
        let mut state = DispatchState::new(self.pool, population, self.config.array_len, rng);
        let mut sink = Blackhole::new();
        let mut runs = ThreadRuns::default();

        state.setup_trial();
        for _ in 0..self.config.warmup.iterations {
            if state.setup_iteration() {
                debug!(generation = state.generation(), thread, "receivers refreshed");
            }
            barrier.wait();
            runs.warmup
                .push(self.iterate(&state, self.config.warmup.time(), &mut sink));
        }
        for _ in 0..self.config.measurement.iterations {
            if state.setup_iteration() {
                debug!(generation = state.generation(), thread, "receivers refreshed");
            }
            barrier.wait();
            runs.measurement
                .push(self.iterate(&state, self.config.measurement.time(), &mut sink));
        }
        runs
    }

    /// Run whole operations until `budget` is spent, at least one.
    fn iterate(&self, state: &DispatchState<'_>, budget: Duration, sink: &mut Blackhole) -> IterationRun {
        let start = Instant::now();
        let mut run = IterationRun::default();
        loop {
            let stats = state.run(self.config.loop_times, sink);
            run.operations += 1;
            run.dispatches += stats.dispatches;
            if start.elapsed() >= budget {
                break;
            }
        }
        run.elapsed = start.elapsed();
        run
    }
}

/// Fold per-thread runs into one sample per iteration.
///
/// Counts add up across threads, elapsed is the slowest thread, and
/// throughput is the sum of each thread's own throughput.
fn merge_phase<F>(runs: &[ThreadRuns], phase: PhaseConfig, unit: TimeUnit, select: F) -> Vec<Sample>
where
    F: Fn(&ThreadRuns) -> &Vec<IterationRun>,
{
    (0..phase.iterations as usize)
        .map(|index| {
            let mut sample = Sample {
                iteration: index as u32 + 1,
                operations: 0,
                dispatches: 0,
                elapsed_ms: 0.0,
                throughput: 0.0,
            };
            for run in runs.iter().filter_map(|thread| select(thread).get(index)) {
                sample.operations += run.operations;
                sample.dispatches += run.dispatches;
                sample.elapsed_ms = sample.elapsed_ms.max(run.elapsed.as_nanos() as f64 / 1_000_000.0);
                sample.throughput += unit.throughput(run.operations, run.elapsed);
            }
            sample
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(threads: u32) -> BenchConfig {
        BenchConfig {
            loop_times: 50,
            forks: 2,
            threads,
            warmup: PhaseConfig::new(1, 1),
            measurement: PhaseConfig::new(3, 1),
            ..BenchConfig::quick()
        }
    }

    #[test]
    fn report_has_one_sample_per_fork_iteration() {
        let pool = ReceiverPool::standard();
        let harness = Harness::new(&pool, quick(1)).unwrap();

        let report = harness.run(Population::Poly);

        assert_eq!(report.benchmark, "dispatch_polymorphic");
        assert_eq!(report.forks.len(), 2);
        assert!(report.forks.iter().all(|fork| fork.warmup.len() == 1));
        assert_eq!(report.measured().count(), 6);
        assert_eq!(report.summary.samples, 6);
        assert_eq!(report.seed, 42);
    }

    #[test]
    fn dispatches_match_operations() {
        let pool = ReceiverPool::standard();
        let harness = Harness::new(&pool, quick(1)).unwrap();

        let report = harness.run(Population::Mono);

        for sample in report.measured() {
            assert!(sample.operations >= 1);
            assert_eq!(sample.dispatches, sample.operations * 50 * 64);
        }
    }

    #[test]
    fn threads_are_summed_into_one_sample() {
        let pool = ReceiverPool::standard();
        let harness = Harness::new(&pool, quick(3)).unwrap();

        let report = harness.run(Population::Mega);

        for sample in report.measured() {
            assert!(sample.operations >= 3);
            assert_eq!(sample.dispatches % (50 * 64), 0);
        }
    }

    #[test]
    fn missing_seed_is_drawn() {
        let pool = ReceiverPool::standard();
        let config = BenchConfig {
            seed: None,
            ..quick(1)
        };
        let harness = Harness::new(&pool, config).unwrap();
        let report = harness.run(Population::Mono);
        assert_eq!(report.seed, harness.seed());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let pool = ReceiverPool::standard();
        let config = BenchConfig {
            threads: 0,
            ..quick(1)
        };
        assert!(Harness::new(&pool, config).is_err());
    }

    #[test]
    fn merge_sums_threads() {
        let run = IterationRun {
            operations: 4,
            dispatches: 256,
            elapsed: Duration::from_millis(2),
        };
        let runs = vec![
            ThreadRuns {
                warmup: Vec::new(),
                measurement: vec![run],
            },
            ThreadRuns {
                warmup: Vec::new(),
                measurement: vec![run],
            },
        ];

        let samples = merge_phase(
            &runs,
            PhaseConfig::new(1, 2),
            TimeUnit::Milliseconds,
            |runs| &runs.measurement,
        );

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].operations, 8);
        assert_eq!(samples[0].dispatches, 512);
        assert_eq!(samples[0].throughput, 4.0);
        assert_eq!(samples[0].elapsed_ms, 2.0);
    }
}
