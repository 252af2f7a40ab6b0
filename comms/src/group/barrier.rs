use std::{collections::HashSet, error::Error, fmt, hash::Hash};

/// Barrier failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarrierErr {
    /// Someone arrived after the barrier had already fired.
    AlreadyFired { expected: usize, arrival: String },
}

impl fmt::Display for BarrierErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyFired { expected, arrival } => write!(
                f,
                "{arrival} arrived after the barrier of {expected} had already fired"
            ),
        }
    }
}

impl Error for BarrierErr {}

/// A one-shot counting barrier over distinct arrivals.
///
/// Fires exactly once, on the arrival of the `expected`-th distinct id. Repeated
/// arrivals of an id before that are ignored, any arrival afterwards is an error.
#[derive(Debug)]
pub struct ArrivalBarrier<K> {
    expected: usize,
    arrived: HashSet<K>,
    fired: bool,
}

impl<K: Eq + Hash + fmt::Debug> ArrivalBarrier<K> {
    /// Creates a new `ArrivalBarrier`.
    ///
    /// # Arguments
    /// * `expected` - The amount of distinct arrivals to wait on.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            arrived: HashSet::with_capacity(expected),
            fired: false,
        }
    }

    /// Records the arrival of `id`.
    ///
    /// # Returns
    /// `true` if this arrival fired the barrier, `false` if it's still waiting,
    /// or a `BarrierErr` if it had already fired.
    pub fn record_arrival(&mut self, id: K) -> Result<bool, BarrierErr> {
        if self.fired {
            return Err(BarrierErr::AlreadyFired {
                expected: self.expected,
                arrival: format!("{id:?}"),
            });
        }

        self.arrived.insert(id);
        self.fired = self.arrived.len() >= self.expected;
        Ok(self.fired)
    }

    pub fn has_arrived(&self, id: &K) -> bool {
        self.arrived.contains(id)
    }

    pub fn arrived(&self) -> usize {
        self.arrived.len()
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_last_distinct_arrival() {
        let mut barrier = ArrivalBarrier::new(3);
        assert_eq!(barrier.record_arrival("a"), Ok(false));
        assert_eq!(barrier.record_arrival("b"), Ok(false));
        assert!(!barrier.is_fired());
        assert_eq!(barrier.record_arrival("c"), Ok(true));
        assert!(barrier.is_fired());
    }

    #[test]
    fn duplicates_are_not_counted() {
        let mut barrier = ArrivalBarrier::new(2);
        assert_eq!(barrier.record_arrival(7), Ok(false));
        assert_eq!(barrier.record_arrival(7), Ok(false));
        assert_eq!(barrier.arrived(), 1);
        assert!(barrier.has_arrived(&7));
        assert_eq!(barrier.record_arrival(8), Ok(true));
    }

    #[test]
    fn arrivals_after_firing_are_violations() {
        let mut barrier = ArrivalBarrier::new(1);
        assert_eq!(barrier.record_arrival(0), Ok(true));
        assert!(barrier.record_arrival(0).is_err());
        assert!(barrier.record_arrival(1).is_err());
        assert_eq!(barrier.arrived(), 1);
    }

    #[test]
    fn order_of_arrivals_is_irrelevant() {
        for order in [[0, 1, 2], [2, 0, 1], [1, 2, 0]] {
            let mut barrier = ArrivalBarrier::new(3);
            let fired: Vec<bool> = order
                .into_iter()
                .map(|id| barrier.record_arrival(id).unwrap())
                .collect();
            assert_eq!(fired, [false, false, true]);
        }
    }
}
