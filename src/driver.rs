//! Dispatch benchmark driver
//!
//! Builds receiver arrays under a [`Population`] policy and runs the
//! dispatch loop over them, feeding every rendered value into a [`Sink`].

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::trace;

use crate::policy::{Population, Refresh};
use crate::receiver::{Receiver, ReceiverPool};
use crate::rng::StreamRng;
use crate::sink::Sink;

/// Slots in one receiver array.
pub const RECEIVER_COUNT: usize = 64;

/// Passes over the array that make up one benchmark operation.
pub const LOOP_TIMES: u64 = 1_000_000;

/// Receivers a callsite is driven with, borrowed from the pool.
#[derive(Debug, Clone, Default)]
pub struct ReceiverArray<'p> {
    slots: Vec<&'p dyn Receiver>,
}

impl<'p> ReceiverArray<'p> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn as_slice(&self) -> &[&'p dyn Receiver] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &'p dyn Receiver> + '_ {
        self.slots.iter().copied()
    }
}

/// Fill a `len` slot array from `pool` according to `population`.
///
/// Mono always picks pool receiver 0. Poly and Mega pick each slot
/// independently and uniformly, with replacement, from the first
/// `distinct_bound()` pool receivers.
pub fn prepare<'p, R>(
    pool: &'p ReceiverPool,
    population: Population,
    len: usize,
    rng: &mut R,
) -> ReceiverArray<'p>
where
    R: Rng,
{
    let bound = population.distinct_bound();
    assert!(
        pool.len() >= bound,
        "{population} needs {bound} receivers but the pool holds {}",
        pool.len()
    );

    let slots = match population {
        Population::Mono => vec![pool.slot(0); len],
        Population::Poly | Population::Mega => (0..len)
            .map(|_| pool.slot(rng.gen_range(0..bound)))
            .collect(),
    };
    trace!(%population, len, "receiver array built");
    ReceiverArray { slots }
}

/// Outcome of one [`run_trial`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialStats {
    pub dispatches: u64,
    pub elapsed: Duration,
}

/// Render every receiver in order, `iterations` times over the array.
pub fn run_trial<S>(receivers: &ReceiverArray<'_>, iterations: u64, sink: &mut S) -> TrialStats
where
    S: Sink + ?Sized,
{
    let start = Instant::now();
    for _ in 0..iterations {
        dispatch(receivers.as_slice(), sink);
    }
    TrialStats {
        dispatches: iterations * receivers.len() as u64,
        elapsed: start.elapsed(),
    }
}

/// The callsite under measurement.
#[inline]
pub fn dispatch<S>(receivers: &[&dyn Receiver], sink: &mut S)
where
    S: Sink + ?Sized,
{
    for receiver in receivers {
        sink.consume(receiver.render());
    }
}

/// Thread-private benchmark state: one policy, one generator, one array.
pub struct DispatchState<'p> {
    pool: &'p ReceiverPool,
    population: Population,
    len: usize,
    rng: StreamRng,
    receivers: ReceiverArray<'p>,
    generation: u64,
}

impl<'p> DispatchState<'p> {
    pub fn new(pool: &'p ReceiverPool, population: Population, len: usize, rng: StreamRng) -> Self {
        Self {
            pool,
            population,
            len,
            rng,
            receivers: ReceiverArray::default(),
            generation: 0,
        }
    }

    pub fn population(&self) -> Population {
        self.population
    }

    pub fn receivers(&self) -> &ReceiverArray<'p> {
        &self.receivers
    }

    /// How many times the array has been rebuilt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuild the array if this policy refreshes at `level`.
    pub fn setup(&mut self, level: Refresh) -> bool {
        if self.population.refresh() != level {
            return false;
        }
        self.receivers = prepare(self.pool, self.population, self.len, &mut self.rng);
        self.generation += 1;
        true
    }

    pub fn setup_trial(&mut self) -> bool {
        self.setup(Refresh::Trial)
    }

    pub fn setup_iteration(&mut self) -> bool {
        self.setup(Refresh::Iteration)
    }

    /// One benchmark operation over the current array.
    pub fn run<S>(&self, loop_times: u64, sink: &mut S) -> TrialStats
    where
        S: Sink + ?Sized,
    {
        run_trial(&self.receivers, loop_times, sink)
    }
}
