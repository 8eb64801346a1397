// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::data::Data;
use crate::engine::sync::lock;
use crate::engine::CompletionSignal;
use crate::traits::Sink;

/// Buffers every envelope and exposes a deduplicated view of the payloads.
///
/// Pair it with an upstream `distinct` stage when set semantics matter for
/// the buffer too.
pub struct CacheSink<T> {
    buffer: Arc<Mutex<Vec<Data<T>>>>,
}

impl<T> Clone for CacheSink<T> {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl<T> Default for CacheSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheSink<T> {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.buffer).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.buffer).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.buffer).clear();
    }
}

impl<T: Clone> CacheSink<T> {
    /// Every buffered envelope, duplicates included.
    pub fn buffer(&self) -> Vec<Data<T>> {
        lock(&self.buffer).clone()
    }

    /// Every buffered payload in arrival order.
    pub fn payloads(&self) -> Vec<T> {
        lock(&self.buffer)
            .iter()
            .map(|data| data.payload().clone())
            .collect()
    }
}

impl<T: Clone + Eq + Hash> CacheSink<T> {
    /// The distinct payloads seen so far.
    pub fn cache(&self) -> HashSet<T> {
        lock(&self.buffer)
            .iter()
            .map(|data| data.payload().clone())
            .collect()
    }
}

impl<T: Send> Sink<T> for CacheSink<T> {
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        lock(&self.buffer).push(data);
        CompletionSignal::completed()
    }

    fn name(&self) -> Option<&str> {
        Some("cache")
    }
}
