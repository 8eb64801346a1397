// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use crate::data::Data;
use crate::engine::sync::lock;
use crate::engine::CompletionSignal;
use crate::traits::Sink;

/// Captures the first envelope, then asks the pipeline to stop.
///
/// Once an item is captured `accepts_more` turns false and the run cancels
/// its upstream. A dispatch racing in after that is ignored.
pub struct HeadSink<T> {
    first: Arc<Mutex<Option<Data<T>>>>,
}

impl<T> Clone for HeadSink<T> {
    fn clone(&self) -> Self {
        Self {
            first: Arc::clone(&self.first),
        }
    }
}

impl<T> Default for HeadSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HeadSink<T> {
    pub fn new() -> Self {
        Self {
            first: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_captured(&self) -> bool {
        lock(&self.first).is_some()
    }
}

impl<T: Clone> HeadSink<T> {
    pub fn value(&self) -> Option<T> {
        lock(&self.first).as_ref().map(|data| data.payload().clone())
    }

    pub fn data(&self) -> Option<Data<T>> {
        lock(&self.first).clone()
    }
}

impl<T: Send> Sink<T> for HeadSink<T> {
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        let mut first = lock(&self.first);
        if first.is_none() {
            *first = Some(data);
        }
        CompletionSignal::completed()
    }

    fn name(&self) -> Option<&str> {
        Some("head")
    }

    fn accepts_more(&self) -> bool {
        !self.is_captured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_ignores_late_dispatch() {
        let sink = HeadSink::new();
        assert!(sink.accepts_more());

        sink.dispatch(Data::new("first"));
        sink.dispatch(Data::new("second"));

        assert_eq!(sink.value(), Some("first"));
        assert!(!sink.accepts_more());
    }

    #[test]
    fn test_head_empty_until_dispatched() {
        let sink = HeadSink::<u8>::new();
        assert_eq!(sink.value(), None);
    }
}
