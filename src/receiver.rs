//! Dispatch receivers and the pool benchmarks draw them from

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::{BenchError, Result};

/// Number of receivers the standard pool holds, and the most any policy needs.
pub const POOL_SIZE: usize = 8;

/// Object a dispatched call lands on.
///
/// Every implementation renders to a fixed piece of text. The call goes
/// through `&dyn Receiver`, so the vtable lookup is the cost being measured.
pub trait Receiver: Send + Sync + fmt::Debug {
    fn render(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

macro_rules! receivers {
    ($($ty:ident => $text:literal),+ $(,)?) => {
        $(
            #[derive(Debug, Default, Clone, Copy)]
            pub struct $ty;

            impl Receiver for $ty {
                fn render(&self) -> &str {
                    $text
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        )+
    };
}

receivers! {
    Receiver1 => "receiver1",
    Receiver2 => "receiver2",
    Receiver3 => "receiver3",
    Receiver4 => "receiver4",
    Receiver5 => "receiver5",
    Receiver6 => "receiver6",
    Receiver7 => "receiver7",
    Receiver8 => "receiver8",
}

/// Immutable, ordered set of receivers of pairwise distinct types.
///
/// Built once and shared read-only by every benchmark thread.
pub struct ReceiverPool {
    receivers: Vec<Box<dyn Receiver>>,
}

impl ReceiverPool {
    pub fn new(receivers: Vec<Box<dyn Receiver>>) -> Result<Self> {
        if receivers.len() < POOL_SIZE {
            return Err(BenchError::PoolTooSmall {
                required: POOL_SIZE,
                available: receivers.len(),
            });
        }

        let mut seen: Vec<TypeId> = Vec::with_capacity(receivers.len());
        for (index, receiver) in receivers.iter().enumerate() {
            let type_id = receiver.as_any().type_id();
            if let Some(first) = seen.iter().position(|known| *known == type_id) {
                return Err(BenchError::DuplicateReceiver {
                    name: receiver.render().to_string(),
                    first,
                    second: index,
                });
            }
            seen.push(type_id);
        }

        Ok(Self { receivers })
    }

    /// The eight receivers `receiver1` .. `receiver8`, in order.
    pub fn standard() -> Self {
        Self {
            receivers: vec![
                Box::new(Receiver1),
                Box::new(Receiver2),
                Box::new(Receiver3),
                Box::new(Receiver4),
                Box::new(Receiver5),
                Box::new(Receiver6),
                Box::new(Receiver7),
                Box::new(Receiver8),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Receiver> {
        self.receivers.get(index).map(|receiver| receiver.as_ref())
    }

    /// Receiver at `index`. Panics when `index` is out of range.
    pub(crate) fn slot(&self, index: usize) -> &dyn Receiver {
        self.receivers[index].as_ref()
    }

    /// Pool slot holding a receiver of the same type, if any.
    pub fn position_of(&self, receiver: &dyn Receiver) -> Option<usize> {
        let type_id = receiver.as_any().type_id();
        self.receivers
            .iter()
            .position(|candidate| candidate.as_any().type_id() == type_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Receiver> {
        self.receivers.iter().map(|receiver| receiver.as_ref())
    }
}

impl Default for ReceiverPool {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ReceiverPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.receivers.iter().map(|receiver| receiver.render()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pool_renders_in_order() {
        let pool = ReceiverPool::standard();
        assert_eq!(pool.len(), POOL_SIZE);
        for (index, receiver) in pool.iter().enumerate() {
            assert_eq!(receiver.render(), format!("receiver{}", index + 1));
        }
    }

    #[test]
    fn render_is_stable_across_calls() {
        let pool = ReceiverPool::standard();
        let receiver = pool.get(4).unwrap();
        for _ in 0..1_000 {
            assert_eq!(receiver.render(), "receiver5");
        }
    }

    #[test]
    fn undersized_pool_is_rejected() {
        let receivers: Vec<Box<dyn Receiver>> = vec![Box::new(Receiver1), Box::new(Receiver2)];
        let err = ReceiverPool::new(receivers).unwrap_err();
        assert!(matches!(
            err,
            BenchError::PoolTooSmall {
                required: 8,
                available: 2
            }
        ));
    }

    #[test]
    fn duplicate_receiver_types_are_rejected() {
        let receivers: Vec<Box<dyn Receiver>> = vec![
            Box::new(Receiver1),
            Box::new(Receiver2),
            Box::new(Receiver3),
            Box::new(Receiver4),
            Box::new(Receiver5),
            Box::new(Receiver6),
            Box::new(Receiver7),
            Box::new(Receiver2),
        ];
        let err = ReceiverPool::new(receivers).unwrap_err();
        assert!(matches!(
            err,
            BenchError::DuplicateReceiver {
                first: 1,
                second: 7,
                ..
            }
        ));
    }

    #[test]
    fn position_of_matches_by_type() {
        let pool = ReceiverPool::standard();
        assert_eq!(pool.position_of(&Receiver1), Some(0));
        assert_eq!(pool.position_of(&Receiver8), Some(7));
    }
}
