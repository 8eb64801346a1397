// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use crate::data::Data;
use crate::engine::sync::lock;
use crate::engine::CompletionSignal;
use crate::traits::Sink;

/// Collects every envelope in arrival order. Never stops early.
pub struct ListSink<T> {
    items: Arc<Mutex<Vec<Data<T>>>>,
}

impl<T> Clone for ListSink<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for ListSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListSink<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }
}

impl<T: Clone> ListSink<T> {
    /// The collected payloads.
    pub fn values(&self) -> Vec<T> {
        lock(&self.items)
            .iter()
            .map(|data| data.payload().clone())
            .collect()
    }

    /// The collected envelopes, metadata included.
    pub fn data(&self) -> Vec<Data<T>> {
        lock(&self.items).clone()
    }
}

impl<T: Send> Sink<T> for ListSink<T> {
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        lock(&self.items).push(data);
        CompletionSignal::completed()
    }

    fn name(&self) -> Option<&str> {
        Some("list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sink_keeps_arrival_order() {
        let sink = ListSink::new();
        for word in ["c", "a", "b"] {
            sink.dispatch(Data::new(word));
        }

        assert_eq!(sink.values(), vec!["c", "a", "b"]);
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn test_list_sink_clones_share_state() {
        let sink = ListSink::new();
        let handle = sink.clone();
        sink.dispatch(Data::new(1));

        assert_eq!(handle.values(), vec![1]);
    }
}
