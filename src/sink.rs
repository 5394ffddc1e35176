//! Consumers for dispatch results

use std::collections::HashMap;
use std::hint::black_box;

/// Accepts every value a dispatch produces so the call cannot be elided.
pub trait Sink {
    fn consume(&mut self, text: &str);
}

/// Sink that hands values to the optimizer as opaque.
#[derive(Debug, Default)]
pub struct Blackhole;

impl Blackhole {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for Blackhole {
    #[inline]
    fn consume(&mut self, text: &str) {
        black_box(text);
    }
}

/// Sink that records what it was fed. Used to verify dispatch counts.
#[derive(Debug, Default)]
pub struct CountingSink {
    total: u64,
    by_text: HashMap<String, u64>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count_of(&self, text: &str) -> u64 {
        self.by_text.get(text).copied().unwrap_or(0)
    }

    pub fn distinct(&self) -> usize {
        self.by_text.len()
    }
}

impl Sink for CountingSink {
    fn consume(&mut self, text: &str) {
        self.total += 1;
        // Avoid allocating once a text has been seen.
        if let Some(count) = self.by_text.get_mut(text) {
            *count += 1;
        } else {
            self.by_text.insert(text.to_string(), 1);
        }
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn consume(&mut self, text: &str) {
        (**self).consume(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_sink_tallies_by_text() {
        let mut sink = CountingSink::new();
        sink.consume("receiver1");
        sink.consume("receiver2");
        sink.consume("receiver1");

        assert_eq!(sink.total(), 3);
        assert_eq!(sink.count_of("receiver1"), 2);
        assert_eq!(sink.count_of("receiver2"), 1);
        assert_eq!(sink.count_of("receiver3"), 0);
        assert_eq!(sink.distinct(), 2);
    }

    #[test]
    fn sink_works_through_mutable_reference() {
        fn feed<S: Sink>(mut sink: S) {
            sink.consume("receiver4");
        }

        let mut sink = CountingSink::new();
        feed(&mut sink);
        feed(&mut sink);
        assert_eq!(sink.total(), 2);
    }
}
