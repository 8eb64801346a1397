// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The subscriber installed by `DataStream::to`.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::Span;

use crate::data::Data;
use crate::engine::completion::{CompletionSignal, Outcome};
use crate::engine::downstream::UpstreamSlot;
use crate::engine::sync::lock;
use crate::errors::StreamError;
use crate::observability::messages::pipeline::{PipelineCompleted, PipelineFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::{Sink, Subscriber, Subscription};

struct RunState {
    in_flight: bool,
    upstream_complete: bool,
    finished: bool,
    items: u64,
}

/// Drives one pipeline run into a sink with one dispatch in flight.
///
/// The next item is requested only after the previous dispatch resolved
/// successfully. The run signal succeeds once upstream completed (or the sink
/// stopped accepting) with nothing in flight, and fails with the first
/// source, transform or sink error.
pub(crate) struct SinkRun<T, S> {
    stream: String,
    sink: S,
    upstream: UpstreamSlot,
    signal: CompletionSignal,
    state: Mutex<RunState>,
    started: Instant,
    span: Span,
    _item: PhantomData<fn(T)>,
}

impl<T, S> SinkRun<T, S>
where
    T: Send + 'static,
    S: Sink<T> + 'static,
{
    pub(crate) fn new(stream: String, sink: S, span: Span) -> Arc<Self> {
        Arc::new(Self {
            stream,
            sink,
            upstream: UpstreamSlot::new(),
            signal: CompletionSignal::new(),
            state: Mutex::new(RunState {
                in_flight: false,
                upstream_complete: false,
                finished: false,
                items: 0,
            }),
            started: Instant::now(),
            span,
            _item: PhantomData,
        })
    }

    pub(crate) fn signal(&self) -> CompletionSignal {
        self.signal.clone()
    }

    fn dispatched(&self, outcome: &Outcome) {
        if let Err(error) = outcome {
            self.upstream.cancel();
            self.finish(Err(error.clone()));
            return;
        }

        enum Next {
            Request,
            Stop,
            Done,
            Nothing,
        }

        let next = {
            let mut state = lock(&self.state);
            state.in_flight = false;
            if state.finished {
                Next::Nothing
            } else if state.upstream_complete {
                Next::Done
            } else if !self.sink.accepts_more() {
                Next::Stop
            } else {
                Next::Request
            }
        };

        match next {
            Next::Request => self.upstream.request(1),
            Next::Stop => {
                self.upstream.cancel();
                self.finish(Ok(()));
            }
            Next::Done => self.finish(Ok(())),
            Next::Nothing => {}
        }
    }

    fn finish(&self, outcome: Outcome) {
        let items = {
            let mut state = lock(&self.state);
            if state.finished {
                return;
            }
            state.finished = true;
            state.items
        };

        let _guard = self.span.enter();
        match &outcome {
            Ok(()) => PipelineCompleted {
                stream: &self.stream,
                sink: self.sink.name().unwrap_or("anonymous"),
                items,
                duration: self.started.elapsed(),
            }
            .log(),
            Err(error) => PipelineFailed {
                stream: &self.stream,
                sink: self.sink.name().unwrap_or("anonymous"),
                items,
                error,
            }
            .log(),
        }
        self.signal.resolve(outcome);
    }
}

/// Subscriber facade over a shared `SinkRun`.
pub(crate) struct SinkSubscriber<T, S>(pub(crate) Arc<SinkRun<T, S>>);

impl<T, S> Subscriber<Data<T>> for SinkSubscriber<T, S>
where
    T: Send + 'static,
    S: Sink<T> + 'static,
{
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.0.upstream.set(subscription);
        self.0.upstream.request(1);
    }

    fn on_next(&self, item: Data<T>) {
        {
            let mut state = lock(&self.0.state);
            if state.finished || state.in_flight {
                return;
            }
            state.in_flight = true;
            state.items += 1;
        }

        let run = Arc::clone(&self.0);
        let _guard = self.0.span.enter();
        self.0
            .sink
            .dispatch(item)
            .on_resolved(move |outcome| run.dispatched(outcome));
    }

    fn on_error(&self, error: StreamError) {
        self.0.finish(Err(error));
    }

    fn on_complete(&self) {
        let done = {
            let mut state = lock(&self.0.state);
            state.upstream_complete = true;
            !state.in_flight
        };
        if done {
            self.0.finish(Ok(()));
        }
    }
}
