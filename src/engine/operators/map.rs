// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::downstream::{Downstream, UpstreamSlot};
use crate::engine::flow::Flow;
use crate::engine::sync::lock;
use crate::errors::StreamError;
use crate::observability::messages::pipeline::ItemDropped;
use crate::observability::messages::StructuredLog;
use crate::traits::{Publisher, Subscriber, Subscription};

/// The per-item step of a synchronous stage.
///
/// `Ok(Some(u))` emits, `Ok(None)` drops the item (and replaces its demand
/// upstream), `Err` fails the stream and cancels upstream.
pub(crate) type StepResult<U> = Result<Option<U>, StreamError>;

/// A one-in, at-most-one-out synchronous stage.
///
/// `make_step` runs once per subscription so stateful steps (scan, distinct)
/// start fresh for every run of the flow.
pub(crate) struct MapPublisher<T, U, M> {
    upstream: Flow<T>,
    stage: &'static str,
    make_step: M,
    _out: PhantomData<fn() -> U>,
}

impl<T, U, M> MapPublisher<T, U, M> {
    pub(crate) fn new(upstream: Flow<T>, stage: &'static str, make_step: M) -> Self {
        Self {
            upstream,
            stage,
            make_step,
            _out: PhantomData,
        }
    }
}

impl<T, U, M, S> Publisher<U> for MapPublisher<T, U, M>
where
    T: Send + 'static,
    U: Send + 'static,
    M: Fn() -> S + Send + Sync,
    S: FnMut(T) -> StepResult<U> + Send + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<U>>) {
        self.upstream.subscribe(Arc::new(MapSubscriber {
            stage: self.stage,
            step: Mutex::new((self.make_step)()),
            upstream: Arc::new(UpstreamSlot::new()),
            downstream: Downstream::new(subscriber),
            done: AtomicBool::new(false),
            _in: PhantomData,
        }));
    }
}

struct MapSubscriber<T, U, S> {
    stage: &'static str,
    step: Mutex<S>,
    upstream: Arc<UpstreamSlot>,
    downstream: Downstream<U>,
    done: AtomicBool,
    _in: PhantomData<fn(T)>,
}

/// Downstream's view: requests pass straight through.
struct PassThrough(Arc<UpstreamSlot>);

impl Subscription for PassThrough {
    fn request(&self, n: u64) {
        self.0.request(n);
    }

    fn cancel(&self) {
        self.0.cancel();
    }
}

impl<T, U, S> Subscriber<T> for MapSubscriber<T, U, S>
where
    T: Send + 'static,
    U: Send + 'static,
    S: FnMut(T) -> StepResult<U> + Send,
{
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.upstream.set(subscription);
        self.downstream
            .subscribe_with(Arc::new(PassThrough(Arc::clone(&self.upstream))));
    }

    fn on_next(&self, item: T) {
        if self.done.load(Ordering::Acquire) {
            return;
        }
        let result = {
            let mut step = lock(&self.step);
            (*step)(item)
        };
        match result {
            Ok(Some(out)) => self.downstream.next(out),
            Ok(None) => {
                ItemDropped { stage: self.stage }.log();
                self.upstream.request(1);
            }
            Err(error) => {
                if !self.done.swap(true, Ordering::AcqRel) {
                    self.upstream.cancel();
                    self.downstream.error(error);
                }
            }
        }
    }

    fn on_error(&self, error: StreamError) {
        if !self.done.swap(true, Ordering::AcqRel) {
            self.downstream.error(error);
        }
    }

    fn on_complete(&self) {
        if !self.done.swap(true, Ordering::AcqRel) {
            self.downstream.complete();
        }
    }
}
