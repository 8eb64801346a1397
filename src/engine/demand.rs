// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Outstanding demand signalled by a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    /// Finite demand with remaining count.
    Finite(u64),
    /// Unbounded demand; reached when cumulative requests overflow `u64`.
    Unbounded,
}

impl Demand {
    pub fn has_demand(&self) -> bool {
        match self {
            Demand::Unbounded => true,
            Demand::Finite(remaining) => *remaining > 0,
        }
    }

    /// Remaining demand as a request amount, `u64::MAX` when unbounded.
    pub fn as_request(&self) -> u64 {
        match self {
            Demand::Unbounded => u64::MAX,
            Demand::Finite(remaining) => *remaining,
        }
    }
}

/// Accumulates `request(n)` calls and consumes them one item at a time.
#[derive(Debug, Clone)]
pub struct DemandTracker {
    current: Demand,
}

impl DemandTracker {
    pub fn new() -> Self {
        Self {
            current: Demand::Finite(0),
        }
    }

    pub fn current(&self) -> Demand {
        self.current
    }

    pub fn has_demand(&self) -> bool {
        self.current.has_demand()
    }

    /// Add demand. `u64::MAX` or an overflowing total switches to unbounded.
    pub fn add(&mut self, amount: u64) -> Demand {
        self.current = match self.current {
            Demand::Unbounded => Demand::Unbounded,
            Demand::Finite(_) if amount == u64::MAX => Demand::Unbounded,
            Demand::Finite(current) => match current.checked_add(amount) {
                Some(total) => Demand::Finite(total),
                None => Demand::Unbounded,
            },
        };
        self.current
    }

    /// Consume one unit of demand when available.
    pub fn consume_one(&mut self) -> bool {
        match self.current {
            Demand::Unbounded => true,
            Demand::Finite(value) if value > 0 => {
                self.current = Demand::Finite(value - 1);
                true
            }
            Demand::Finite(_) => false,
        }
    }
}

impl Default for DemandTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_exactly_what_was_requested() {
        let mut tracker = DemandTracker::new();
        assert!(!tracker.consume_one());

        tracker.add(2);
        assert!(tracker.consume_one());
        assert!(tracker.consume_one());
        assert!(!tracker.consume_one());
        assert_eq!(tracker.current(), Demand::Finite(0));
    }

    #[test]
    fn overflow_becomes_unbounded() {
        let mut tracker = DemandTracker::new();
        tracker.add(u64::MAX - 1);
        assert_eq!(tracker.add(5), Demand::Unbounded);
        assert!(tracker.consume_one());
        assert_eq!(tracker.current().as_request(), u64::MAX);
    }

    #[test]
    fn max_request_is_unbounded() {
        let mut tracker = DemandTracker::new();
        assert_eq!(tracker.add(u64::MAX), Demand::Unbounded);
    }
}
