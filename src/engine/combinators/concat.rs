// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use crate::engine::demand::DemandTracker;
use crate::engine::downstream::Downstream;
use crate::engine::flow::Flow;
use crate::engine::sync::{lock, Drain};
use crate::errors::StreamError;
use crate::traits::{Publisher, Subscriber, Subscription};

/// Drains the sources one after another.
///
/// Only the active source is subscribed; the next one is subscribed when it
/// completes and inherits whatever downstream demand is still outstanding.
/// An error ends the concatenation without touching later sources.
pub(crate) struct ConcatPublisher<T> {
    sources: Vec<Flow<T>>,
}

impl<T> ConcatPublisher<T> {
    pub(crate) fn new(sources: Vec<Flow<T>>) -> Self {
        Self { sources }
    }
}

impl<T: Send + 'static> Publisher<T> for ConcatPublisher<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        let inner = Arc::new(ConcatInner {
            sources: self.sources.clone(),
            downstream: Downstream::new(subscriber),
            state: Mutex::new(ConcatState {
                next_index: 0,
                active: None,
                demand: DemandTracker::new(),
                cancelled: false,
                finished: false,
            }),
            advance: Drain::new(),
        });
        inner
            .downstream
            .subscribe_with(Arc::new(ConcatSubscription(Arc::clone(&inner))));
        inner.subscribe_next();
    }
}

struct ConcatState {
    next_index: usize,
    active: Option<Arc<dyn Subscription>>,
    /// Requested by downstream and not yet delivered.
    demand: DemandTracker,
    cancelled: bool,
    finished: bool,
}

struct ConcatInner<T> {
    sources: Vec<Flow<T>>,
    downstream: Downstream<T>,
    state: Mutex<ConcatState>,
    advance: Drain,
}

impl<T: Send + 'static> ConcatInner<T> {
    /// Subscribe the next source, or complete when none are left.
    ///
    /// Runs through a drain so a synchronous source completing inside its own
    /// `subscribe` call does not nest the next subscription on the stack.
    fn subscribe_next(self: &Arc<Self>) {
        self.advance.run(|| {
            let source = {
                let mut state = lock(&self.state);
                if state.cancelled || state.finished {
                    return;
                }
                state.active = None;
                match self.sources.get(state.next_index) {
                    Some(source) => {
                        state.next_index += 1;
                        Some(source.clone())
                    }
                    None => {
                        state.finished = true;
                        None
                    }
                }
            };

            match source {
                Some(source) => source.subscribe(Arc::new(ConcatSubscriber {
                    inner: Arc::clone(self),
                })),
                None => {
                    self.downstream.complete();
                }
            }
        });
    }
}

struct ConcatSubscriber<T> {
    inner: Arc<ConcatInner<T>>,
}

impl<T: Send + 'static> Subscriber<T> for ConcatSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        let outstanding = {
            let mut state = lock(&self.inner.state);
            if state.cancelled || state.finished {
                None
            } else {
                state.active = Some(Arc::clone(&subscription));
                Some(state.demand.current().as_request())
            }
        };

        match outstanding {
            None => subscription.cancel(),
            Some(0) => {}
            Some(n) => subscription.request(n),
        }
    }

    fn on_next(&self, item: T) {
        {
            let mut state = lock(&self.inner.state);
            if state.finished {
                return;
            }
            state.demand.consume_one();
        }
        self.inner.downstream.next(item);
    }

    fn on_error(&self, error: StreamError) {
        {
            let mut state = lock(&self.inner.state);
            state.finished = true;
            state.active = None;
        }
        self.inner.downstream.error(error);
    }

    fn on_complete(&self) {
        self.inner.subscribe_next();
    }
}

struct ConcatSubscription<T>(Arc<ConcatInner<T>>);

impl<T: Send + 'static> Subscription for ConcatSubscription<T> {
    fn request(&self, n: u64) {
        if n == 0 {
            self.cancel_active();
            self.0.downstream.error(StreamError::InvalidDemand(0));
            return;
        }
        let active = {
            let mut state = lock(&self.0.state);
            state.demand.add(n);
            state.active.clone()
        };
        if let Some(active) = active {
            active.request(n);
        }
    }

    fn cancel(&self) {
        self.cancel_active();
        self.0.downstream.release();
    }
}

impl<T: Send + 'static> ConcatSubscription<T> {
    fn cancel_active(&self) {
        let active = {
            let mut state = lock(&self.0.state);
            state.cancelled = true;
            state.active.take()
        };
        if let Some(active) = active {
            active.cancel();
        }
    }
}
