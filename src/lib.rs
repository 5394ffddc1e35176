pub mod config;
pub mod driver;
pub mod error;
pub mod harness;
pub mod policy;
pub mod receiver;
pub mod report;
pub mod rng;
pub mod sink;

pub use config::BenchConfig;
pub use driver::{prepare, run_trial, DispatchState, ReceiverArray, TrialStats};
pub use error::BenchError;
pub use harness::Harness;
pub use policy::{Population, Refresh};
pub use receiver::{Receiver, ReceiverPool};
pub use sink::{Blackhole, CountingSink, Sink};
