// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use crate::data::Data;
use crate::engine::sync::lock;
use crate::engine::CompletionSignal;
use crate::traits::Sink;

/// Keeps the most recent envelope. Meaningful once the run completed.
pub struct TailSink<T> {
    last: Arc<Mutex<Option<Data<T>>>>,
}

impl<T> Clone for TailSink<T> {
    fn clone(&self) -> Self {
        Self {
            last: Arc::clone(&self.last),
        }
    }
}

impl<T> Default for TailSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TailSink<T> {
    pub fn new() -> Self {
        Self {
            last: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T: Clone> TailSink<T> {
    pub fn value(&self) -> Option<T> {
        lock(&self.last).as_ref().map(|data| data.payload().clone())
    }

    pub fn data(&self) -> Option<Data<T>> {
        lock(&self.last).clone()
    }
}

impl<T: Send> Sink<T> for TailSink<T> {
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        *lock(&self.last) = Some(data);
        CompletionSignal::completed()
    }

    fn name(&self) -> Option<&str> {
        Some("tail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_last() {
        let sink = TailSink::new();
        for n in 1..=4 {
            sink.dispatch(Data::new(n));
        }
        assert_eq!(sink.value(), Some(4));
    }
}
