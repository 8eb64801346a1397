// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;

use crate::data::Data;
use crate::engine::CompletionSignal;
use crate::errors::StreamError;
use crate::traits::Sink;

/// Calls a function for every envelope.
pub struct ForEachSink<F> {
    f: F,
}

impl<F> ForEachSink<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> Sink<T> for ForEachSink<F>
where
    F: Fn(Data<T>) + Send + Sync,
{
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        (self.f)(data);
        CompletionSignal::completed()
    }

    fn name(&self) -> Option<&str> {
        Some("for_each")
    }
}

/// Calls a fallible function for every envelope; an error fails the run.
pub struct TryForEachSink<F> {
    f: F,
}

impl<F> TryForEachSink<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> Sink<T> for TryForEachSink<F>
where
    F: Fn(Data<T>) -> anyhow::Result<()> + Send + Sync,
{
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        match (self.f)(data) {
            Ok(()) => CompletionSignal::completed(),
            Err(err) => CompletionSignal::failed(StreamError::sink(err)),
        }
    }

    fn name(&self) -> Option<&str> {
        Some("try_for_each")
    }
}

/// Runs an asynchronous function per envelope on the ambient tokio runtime.
///
/// The next envelope is dispatched only once the previous future finished.
/// A failing future fails the run.
pub struct ForEachAsyncSink<F> {
    f: F,
}

impl<F> ForEachAsyncSink<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F, Fut> Sink<T> for ForEachAsyncSink<F>
where
    F: Fn(Data<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        let future = (self.f)(data);
        CompletionSignal::spawn("for_each_async", async move {
            future.await.map_err(StreamError::sink)
        })
    }

    fn name(&self) -> Option<&str> {
        Some("for_each_async")
    }
}

/// Accepts everything and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl<T> Sink<T> for DiscardSink {
    fn dispatch(&self, _data: Data<T>) -> CompletionSignal {
        CompletionSignal::completed()
    }

    fn name(&self) -> Option<&str> {
        Some("discard")
    }
}
