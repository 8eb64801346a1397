// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::engine::downstream::{reject, Downstream, UpstreamSlot};
use crate::engine::flow::Flow;
use crate::engine::operators::map::StepResult;
use crate::errors::StreamError;
use crate::observability::messages::pipeline::{ItemDropped, StageCancelled, StageStarted};
use crate::observability::messages::StructuredLog;
use crate::traits::{Publisher, Subscriber, Subscription};

pub(crate) type StepFuture<U> = Pin<Box<dyn Future<Output = StepResult<U>> + Send>>;

enum StageEvent<U> {
    Item(StepFuture<U>),
    Error(StreamError),
    Complete,
}

/// A stage whose per-item step is asynchronous.
///
/// The step's future is created when the item arrives and awaited by a single
/// worker task in arrival order, so output order equals input order and a
/// timer started on arrival keeps running while earlier items are awaited.
pub(crate) struct AsyncStagePublisher<T, U, F> {
    upstream: Flow<T>,
    stage: &'static str,
    step: Arc<F>,
    _out: PhantomData<fn() -> U>,
}

impl<T, U, F> AsyncStagePublisher<T, U, F> {
    pub(crate) fn new(upstream: Flow<T>, stage: &'static str, step: F) -> Self {
        Self {
            upstream,
            stage,
            step: Arc::new(step),
            _out: PhantomData,
        }
    }
}

impl<T, U, F> Publisher<U> for AsyncStagePublisher<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> StepFuture<U> + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<U>>) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                reject(subscriber, StreamError::NoRuntime(self.stage.to_string()));
                return;
            }
        };

        let (events, receiver) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let upstream = Arc::new(UpstreamSlot::new());
        let downstream = Arc::new(Downstream::new(subscriber));

        let started = StageStarted { stage: self.stage };
        started.log();
        handle.spawn(
            run_worker(
                self.stage,
                receiver,
                token.clone(),
                Arc::clone(&upstream),
                Arc::clone(&downstream),
            )
            .instrument(started.span("stage_worker")),
        );

        self.upstream.subscribe(Arc::new(AsyncStageSubscriber {
            step: Arc::clone(&self.step),
            events,
            token,
            upstream,
            downstream,
            _in: PhantomData,
        }));
    }
}

async fn run_worker<U: Send + 'static>(
    stage: &'static str,
    mut receiver: mpsc::UnboundedReceiver<StageEvent<U>>,
    token: CancellationToken,
    upstream: Arc<UpstreamSlot>,
    downstream: Arc<Downstream<U>>,
) {
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            event = receiver.recv() => event,
        };
        match event {
            Some(StageEvent::Item(future)) => {
                let result = tokio::select! {
                    _ = token.cancelled() => break,
                    result = future => result,
                };
                match result {
                    Ok(Some(item)) => downstream.next(item),
                    Ok(None) => {
                        ItemDropped { stage }.log();
                        upstream.request(1);
                    }
                    Err(error) => {
                        upstream.cancel();
                        downstream.error(error);
                        break;
                    }
                }
            }
            Some(StageEvent::Error(error)) => {
                downstream.error(error);
                break;
            }
            Some(StageEvent::Complete) => {
                downstream.complete();
                break;
            }
            None => break,
        }
    }
    if token.is_cancelled() {
        StageCancelled { stage }.log();
    }
}

struct AsyncStageSubscriber<T, U, F> {
    step: Arc<F>,
    events: mpsc::UnboundedSender<StageEvent<U>>,
    token: CancellationToken,
    upstream: Arc<UpstreamSlot>,
    downstream: Arc<Downstream<U>>,
    _in: PhantomData<fn(T)>,
}

struct AsyncStageSubscription {
    token: CancellationToken,
    upstream: Arc<UpstreamSlot>,
}

impl Subscription for AsyncStageSubscription {
    fn request(&self, n: u64) {
        self.upstream.request(n);
    }

    fn cancel(&self) {
        self.token.cancel();
        self.upstream.cancel();
    }
}

impl<T, U, F> Subscriber<T> for AsyncStageSubscriber<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> StepFuture<U> + Send + Sync + 'static,
{
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.upstream.set(subscription);
        self.downstream.subscribe_with(Arc::new(AsyncStageSubscription {
            token: self.token.clone(),
            upstream: Arc::clone(&self.upstream),
        }));
    }

    fn on_next(&self, item: T) {
        // A closed channel means the worker already finished.
        let _ = self.events.send(StageEvent::Item((self.step)(item)));
    }

    fn on_error(&self, error: StreamError) {
        let _ = self.events.send(StageEvent::Error(error));
    }

    fn on_complete(&self) {
        let _ = self.events.send(StageEvent::Complete);
    }
}
