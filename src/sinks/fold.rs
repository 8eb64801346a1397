// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use crate::data::Data;
use crate::engine::sync::lock;
use crate::engine::CompletionSignal;
use crate::traits::Sink;

/// Reduces payloads into a single accumulator.
///
/// The reducer receives `(item, accumulator)` and returns the new accumulator.
/// `value()` can be read at any time and reflects the items seen so far.
pub struct FoldSink<A, F> {
    accumulator: Arc<Mutex<A>>,
    reducer: Arc<F>,
}

impl<A, F> Clone for FoldSink<A, F> {
    fn clone(&self) -> Self {
        Self {
            accumulator: Arc::clone(&self.accumulator),
            reducer: Arc::clone(&self.reducer),
        }
    }
}

impl<A, F> FoldSink<A, F> {
    pub fn new(seed: A, reducer: F) -> Self {
        Self {
            accumulator: Arc::new(Mutex::new(seed)),
            reducer: Arc::new(reducer),
        }
    }
}

impl<A: Clone, F> FoldSink<A, F> {
    pub fn value(&self) -> A {
        lock(&self.accumulator).clone()
    }
}

impl<T, A, F> Sink<T> for FoldSink<A, F>
where
    A: Clone + Send,
    F: Fn(T, A) -> A + Send + Sync,
{
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        let mut accumulator = lock(&self.accumulator);
        let next = (self.reducer)(data.into_payload(), accumulator.clone());
        *accumulator = next;
        CompletionSignal::completed()
    }

    fn name(&self) -> Option<&str> {
        Some("fold")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_sums() {
        let sink = FoldSink::new(0, |item: i32, acc: i32| acc + item);
        for n in [1, 2, 3] {
            sink.dispatch(Data::new(n));
        }
        assert_eq!(sink.value(), 6);
    }

    #[test]
    fn test_fold_value_starts_at_seed() {
        let sink = FoldSink::new(String::from("seed"), |item: String, acc: String| acc + &item);
        assert_eq!(sink.value(), "seed");

        sink.dispatch(Data::new("!".to_string()));
        assert_eq!(sink.value(), "seed!");
    }
}
