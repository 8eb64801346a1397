// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::consts::DEFAULT_PREFETCH;
use crate::data::{Data, Metadata, Pair, Tuple};
use crate::engine::completion::CompletionSignal;
use crate::engine::flow::Flow;
use crate::engine::terminal::{SinkRun, SinkSubscriber};
use crate::errors::StreamError;
use crate::observability::messages::pipeline::PipelineAttached;
use crate::observability::messages::StructuredLog;
use crate::traits::Sink;

const UNNAMED_STREAM: &str = "unnamed";

/// Sources are pipelines that nothing upstream feeds.
pub type Source<T> = DataStream<T>;

/// A named, lazy pipeline over envelopes.
///
/// Every combinator returns a new `DataStream` wrapping the previous one.
/// Nothing runs until [`DataStream::to`] attaches a sink, and every attachment
/// is an independent run of the whole chain.
///
/// # Example
/// ```
/// use fluid_constructs::engine::Source;
/// use fluid_constructs::sinks;
///
/// let list = sinks::list();
/// let outcome = Source::from_payloads(vec![1, 2, 3, 4, 5])
///     .transform_payload(|n| n + 1)
///     .to(list.clone());
///
/// assert_eq!(outcome.outcome(), Some(Ok(())));
/// assert_eq!(list.values(), vec![2, 3, 4, 5, 6]);
/// ```
pub struct DataStream<T> {
    name: Option<String>,
    flow: Flow<Data<T>>,
    prefetch: u64,
}

impl<T> Clone for DataStream<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            flow: self.flow.clone(),
            prefetch: self.prefetch,
        }
    }
}

/// Internal tag distinguishing the two sides of a heterogeneous zip.
enum Side<A, B> {
    Left(Data<A>),
    Right(Data<B>),
}

fn merge_metadata<'a>(parts: impl IntoIterator<Item = &'a Metadata>) -> Metadata {
    let mut merged = Metadata::new();
    for part in parts {
        merged.extend(part.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
    merged
}

impl<T: Send + 'static> DataStream<T> {
    pub fn from_flow(flow: Flow<Data<T>>) -> Self {
        Self {
            name: None,
            flow,
            prefetch: DEFAULT_PREFETCH,
        }
    }

    /// A source emitting the given envelopes.
    pub fn from_data<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Data<T>> + Clone + Send + Sync + 'static,
        I::IntoIter: Send + 'static,
    {
        Self::from_flow(Flow::from_items(items))
    }

    /// A source wrapping each payload in an envelope with empty metadata.
    pub fn from_payloads<I>(payloads: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        I::IntoIter: Send + 'static,
    {
        Self::from_flow(Flow::from_items(payloads).map(Data::new))
    }

    /// A source over a flow of bare payloads.
    pub fn from_payload_flow(flow: Flow<T>) -> Self {
        Self::from_flow(flow.map(Data::new))
    }

    pub fn empty() -> Self {
        Self::from_flow(Flow::empty())
    }

    pub fn failed(error: StreamError) -> Self {
        Self::from_flow(Flow::failed(error))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Per-source demand batch used by `merge_with` and `zip_*`.
    pub fn with_prefetch(mut self, prefetch: u64) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    pub fn prefetch(&self) -> u64 {
        self.prefetch
    }

    /// The underlying envelope flow.
    pub fn flow(&self) -> Flow<Data<T>> {
        self.flow.clone()
    }

    fn derive<U: Send + 'static>(&self, flow: Flow<Data<U>>) -> DataStream<U> {
        DataStream {
            name: self.name.clone(),
            flow,
            prefetch: self.prefetch,
        }
    }

    pub fn transform<U, F>(&self, f: F) -> DataStream<U>
    where
        U: Send + 'static,
        F: Fn(Data<T>) -> Data<U> + Send + Sync + 'static,
    {
        self.derive(self.flow.map(f))
    }

    /// Transform with a fallible function; a failure halts the pipeline.
    pub fn try_transform<U, F>(&self, f: F) -> DataStream<U>
    where
        U: Send + 'static,
        F: Fn(Data<T>) -> anyhow::Result<Data<U>> + Send + Sync + 'static,
    {
        self.derive(self.flow.try_map(f))
    }

    /// Transform the payload and keep the metadata.
    pub fn transform_payload<U, F>(&self, f: F) -> DataStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.derive(self.flow.map(move |data: Data<T>| data.map(&f)))
    }

    pub fn try_transform_payload<U, F>(&self, f: F) -> DataStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> anyhow::Result<U> + Send + Sync + 'static,
    {
        self.derive(self.flow.try_map(move |data: Data<T>| {
            let metadata = Arc::clone(data.shared_metadata());
            f(data.into_payload()).map(|payload| Data::from_shared(payload, metadata))
        }))
    }

    /// Transform the payload; `None` drops the envelope.
    pub fn transform_payload_opt<U, F>(&self, f: F) -> DataStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        self.derive(self.flow.filter_map(move |data: Data<T>| {
            let metadata = Arc::clone(data.shared_metadata());
            f(data.into_payload()).map(|payload| Data::from_shared(payload, metadata))
        }))
    }

    pub fn filter_payload<P>(&self, predicate: P) -> DataStream<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.derive(self.flow.filter(move |data: &Data<T>| predicate(data.payload())))
    }

    /// Replace the envelope flow with an arbitrary flow-to-flow operation.
    pub fn transform_flow<U, F>(&self, f: F) -> DataStream<U>
    where
        U: Send + 'static,
        F: FnOnce(Flow<Data<T>>) -> Flow<Data<U>>,
    {
        self.derive(f(self.flow.clone()))
    }

    /// Like [`DataStream::transform_flow`] over bare payloads.
    ///
    /// Metadata does not survive: results are wrapped in fresh envelopes.
    pub fn transform_payload_flow<U, F>(&self, f: F) -> DataStream<U>
    where
        U: Send + 'static,
        F: FnOnce(Flow<T>) -> Flow<U>,
    {
        let payloads = self.flow.map(Data::into_payload);
        self.derive(f(payloads).map(Data::new))
    }

    /// Interleave this stream with `others` in arrival order.
    pub fn merge_with(&self, others: impl IntoIterator<Item = DataStream<T>>) -> DataStream<T> {
        let flows = std::iter::once(self.flow.clone())
            .chain(others.into_iter().map(|other| other.flow))
            .collect();
        self.derive(Flow::merge(flows, self.prefetch))
    }

    /// This stream's items, then each of `others` in turn.
    pub fn concat_with(&self, others: impl IntoIterator<Item = DataStream<T>>) -> DataStream<T> {
        let flows = std::iter::once(self.flow.clone())
            .chain(others.into_iter().map(|other| other.flow))
            .collect();
        self.derive(Flow::concat(flows))
    }

    /// Pair this stream's items with `other`'s by position.
    ///
    /// Metadata of both envelopes is merged, `other`'s entries winning on
    /// key clashes.
    pub fn zip_with<U: Send + 'static>(&self, other: DataStream<U>) -> DataStream<Pair<T, U>> {
        let left = self.flow.map(Side::Left);
        let right = other.flow.map(Side::Right);
        let zip_step = |round: Vec<Side<T, U>>| {
            let mut sides = round.into_iter();
            match (sides.next(), sides.next()) {
                (Some(Side::Left(left)), Some(Side::Right(right))) => {
                    let metadata = merge_metadata([left.metadata(), right.metadata()]);
                    let pair = Pair::new(left.into_payload(), right.into_payload());
                    Ok(Some(Data::with_metadata(pair, metadata)))
                }
                _ => Err(StreamError::Internal(
                    "zip round arrived out of source order".to_string(),
                )),
            }
        };
        let rounds = Flow::zip(vec![left, right], self.prefetch).step("zip_with", zip_step);
        self.derive(rounds)
    }

    /// Combine this stream with `others` by position into n-way tuples.
    ///
    /// Metadata is merged in source order, later sources winning on clashes.
    pub fn zip_all(&self, others: impl IntoIterator<Item = DataStream<T>>) -> DataStream<Tuple<T>> {
        let flows = std::iter::once(self.flow.clone())
            .chain(others.into_iter().map(|other| other.flow))
            .collect();
        let rounds = Flow::zip(flows, self.prefetch).map(|round: Vec<Data<T>>| {
            let metadata = merge_metadata(round.iter().map(Data::metadata));
            let payloads = round.into_iter().map(Data::into_payload).collect();
            Data::with_metadata(Tuple::new(payloads), metadata)
        });
        self.derive(rounds)
    }

    /// Split into `branches` streams that each see every envelope.
    ///
    /// The upstream runs once, after every branch has a sink attached, at the
    /// pace of the slowest branch.
    pub fn broadcast(&self, branches: usize) -> Vec<DataStream<T>>
    where
        T: Clone,
    {
        self.flow
            .broadcast(branches)
            .into_iter()
            .map(|flow| self.derive(flow))
            .collect()
    }

    /// Attach a sink and start the run.
    ///
    /// The returned signal is the run's single outcome: success once every
    /// item was accepted and the source completed, otherwise the first error.
    pub fn to<S>(&self, sink: S) -> CompletionSignal
    where
        S: Sink<T> + 'static,
    {
        let stream = self.name.as_deref().unwrap_or(UNNAMED_STREAM).to_string();
        let attached = PipelineAttached {
            stream: &stream,
            sink: sink.name().unwrap_or("anonymous"),
        };
        let span = attached.span("pipeline_run");
        let _guard = span.enter();
        attached.log();

        let run = SinkRun::new(stream, sink, span.clone());
        let signal = run.signal();
        self.flow.subscribe(Arc::new(SinkSubscriber(run)));
        signal
    }
}
