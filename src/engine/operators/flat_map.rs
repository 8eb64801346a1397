// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use crate::engine::demand::DemandTracker;
use crate::engine::downstream::{Downstream, UpstreamSlot};
use crate::engine::flow::Flow;
use crate::engine::sync::{lock, Drain};
use crate::errors::StreamError;
use crate::traits::{Publisher, Subscriber, Subscription};

/// Expands every upstream item into zero or more items, in order.
///
/// Pulls one upstream item at a time and only when the expansion buffer is
/// empty and downstream still has demand.
pub(crate) struct FlatMapIterPublisher<T, U, F> {
    upstream: Flow<T>,
    expand: Arc<F>,
    _out: PhantomData<fn() -> U>,
}

impl<T, U, F> FlatMapIterPublisher<T, U, F> {
    pub(crate) fn new(upstream: Flow<T>, expand: F) -> Self {
        Self {
            upstream,
            expand: Arc::new(expand),
            _out: PhantomData,
        }
    }
}

impl<T, U, F, I> Publisher<U> for FlatMapIterPublisher<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> I + Send + Sync + 'static,
    I: IntoIterator<Item = U>,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<U>>) {
        let inner = Arc::new(FlatMapInner {
            expand: Arc::clone(&self.expand),
            upstream: UpstreamSlot::new(),
            downstream: Downstream::new(subscriber),
            state: Mutex::new(FlatMapState {
                buffer: VecDeque::new(),
                demand: DemandTracker::new(),
                awaiting: false,
                upstream_done: false,
                error: None,
                finished: false,
            }),
            drain: Drain::new(),
            _in: PhantomData,
        });
        self.upstream.subscribe(Arc::new(FlatMapSubscriber(inner)));
    }
}

struct FlatMapState<U> {
    buffer: VecDeque<U>,
    demand: DemandTracker,
    awaiting: bool,
    upstream_done: bool,
    error: Option<StreamError>,
    finished: bool,
}

struct FlatMapInner<T, U, F> {
    expand: Arc<F>,
    upstream: UpstreamSlot,
    downstream: Downstream<U>,
    state: Mutex<FlatMapState<U>>,
    drain: Drain,
    _in: PhantomData<fn(T)>,
}

enum Step<U> {
    Emit(U),
    Pull,
    Fail(StreamError),
    Complete,
    Idle,
}

impl<T, U, F, I> FlatMapInner<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> I + Send + Sync,
    I: IntoIterator<Item = U>,
{
    fn drain(&self) {
        self.drain.run(|| loop {
            let step = {
                let mut state = lock(&self.state);
                if state.finished {
                    Step::Idle
                } else if let Some(error) = state.error.take() {
                    state.finished = true;
                    state.buffer.clear();
                    Step::Fail(error)
                } else if !state.buffer.is_empty() {
                    if state.demand.consume_one() {
                        match state.buffer.pop_front() {
                            Some(item) => Step::Emit(item),
                            None => Step::Idle,
                        }
                    } else {
                        Step::Idle
                    }
                } else if state.upstream_done {
                    state.finished = true;
                    Step::Complete
                } else if state.demand.has_demand() && !state.awaiting {
                    state.awaiting = true;
                    Step::Pull
                } else {
                    Step::Idle
                }
            };

            match step {
                Step::Emit(item) => self.downstream.next(item),
                Step::Pull => self.upstream.request(1),
                Step::Fail(error) => {
                    self.upstream.cancel();
                    self.downstream.error(error);
                    return;
                }
                Step::Complete => {
                    self.downstream.complete();
                    return;
                }
                Step::Idle => return,
            }
        });
    }
}

struct FlatMapSubscriber<T, U, F>(Arc<FlatMapInner<T, U, F>>);

struct FlatMapSubscription<T, U, F>(Arc<FlatMapInner<T, U, F>>);

impl<T, U, F, I> Subscriber<T> for FlatMapSubscriber<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> I + Send + Sync + 'static,
    I: IntoIterator<Item = U>,
{
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.0.upstream.set(subscription);
        self.0
            .downstream
            .subscribe_with(Arc::new(FlatMapSubscription(Arc::clone(&self.0))));
    }

    fn on_next(&self, item: T) {
        let expanded: Vec<U> = (self.0.expand)(item).into_iter().collect();
        {
            let mut state = lock(&self.0.state);
            state.awaiting = false;
            state.buffer.extend(expanded);
        }
        self.0.drain();
    }

    fn on_error(&self, error: StreamError) {
        lock(&self.0.state).error = Some(error);
        self.0.drain();
    }

    fn on_complete(&self) {
        lock(&self.0.state).upstream_done = true;
        self.0.drain();
    }
}

impl<T, U, F, I> Subscription for FlatMapSubscription<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> I + Send + Sync + 'static,
    I: IntoIterator<Item = U>,
{
    fn request(&self, n: u64) {
        {
            let mut state = lock(&self.0.state);
            if n == 0 {
                state.error = Some(StreamError::InvalidDemand(0));
            } else {
                state.demand.add(n);
            }
        }
        self.0.drain();
    }

    fn cancel(&self) {
        {
            let mut state = lock(&self.0.state);
            state.finished = true;
            state.buffer.clear();
        }
        self.0.upstream.cancel();
        self.0.downstream.release();
    }
}
