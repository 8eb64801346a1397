// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::engine::demand::DemandTracker;
use crate::engine::downstream::{complete_empty, Downstream, UpstreamSlot};
use crate::engine::flow::Flow;
use crate::engine::sync::{lock, Drain};
use crate::errors::StreamError;
use crate::traits::{Publisher, Subscriber, Subscription};

/// Interleaves all sources in arrival order.
///
/// Every source is subscribed at once with `prefetch` outstanding demand of
/// its own, topped up by one each time one of its items is emitted. The
/// first error cancels the remaining sources.
pub(crate) struct MergePublisher<T> {
    sources: Vec<Flow<T>>,
    prefetch: u64,
}

impl<T> MergePublisher<T> {
    pub(crate) fn new(sources: Vec<Flow<T>>, prefetch: u64) -> Self {
        Self {
            sources,
            prefetch: prefetch.max(1),
        }
    }
}

impl<T: Send + 'static> Publisher<T> for MergePublisher<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        if self.sources.is_empty() {
            complete_empty(subscriber);
            return;
        }

        let inner = Arc::new(MergeInner {
            slots: (0..self.sources.len()).map(|_| UpstreamSlot::new()).collect(),
            prefetch: self.prefetch,
            downstream: Downstream::new(subscriber),
            state: Mutex::new(MergeState {
                queue: VecDeque::new(),
                done: vec![false; self.sources.len()],
                demand: DemandTracker::new(),
                error: None,
                finished: false,
            }),
            drain: Drain::new(),
        });

        inner
            .downstream
            .subscribe_with(Arc::new(MergeSubscription(Arc::clone(&inner))));

        for (index, source) in self.sources.iter().enumerate() {
            source.subscribe(Arc::new(MergeSubscriber {
                inner: Arc::clone(&inner),
                index,
            }));
        }
    }
}

struct MergeState<T> {
    /// Items in arrival order, tagged with their source index.
    queue: VecDeque<(usize, T)>,
    done: Vec<bool>,
    demand: DemandTracker,
    error: Option<StreamError>,
    finished: bool,
}

struct MergeInner<T> {
    slots: Vec<UpstreamSlot>,
    prefetch: u64,
    downstream: Downstream<T>,
    state: Mutex<MergeState<T>>,
    drain: Drain,
}

enum Step<T> {
    Emit(usize, T),
    Fail(StreamError),
    Complete,
    Idle,
}

impl<T: Send + 'static> MergeInner<T> {
    fn drain(&self) {
        self.drain.run(|| loop {
            let step = {
                let mut state = lock(&self.state);
                if state.finished {
                    Step::Idle
                } else if let Some(error) = state.error.take() {
                    state.finished = true;
                    state.queue.clear();
                    Step::Fail(error)
                } else if !state.queue.is_empty() && state.demand.consume_one() {
                    match state.queue.pop_front() {
                        Some((index, item)) => Step::Emit(index, item),
                        None => Step::Idle,
                    }
                } else if state.queue.is_empty() && state.done.iter().all(|done| *done) {
                    state.finished = true;
                    Step::Complete
                } else {
                    Step::Idle
                }
            };

            match step {
                Step::Emit(index, item) => {
                    self.downstream.next(item);
                    self.slots[index].request(1);
                }
                Step::Fail(error) => {
                    self.cancel_sources();
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

    fn cancel_sources(&self) {
        for slot in &self.slots {
            slot.cancel();
        }
    }
}

struct MergeSubscriber<T> {
    inner: Arc<MergeInner<T>>,
    index: usize,
}

impl<T: Send + 'static> Subscriber<T> for MergeSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        let slot = &self.inner.slots[self.index];
        slot.set(subscription);
        slot.request(self.inner.prefetch);
    }

    fn on_next(&self, item: T) {
        {
            let mut state = lock(&self.inner.state);
            if state.finished {
                return;
            }
            state.queue.push_back((self.index, item));
        }
        self.inner.drain();
    }

    fn on_error(&self, error: StreamError) {
        {
            let mut state = lock(&self.inner.state);
            if state.error.is_none() {
                state.error = Some(error);
            }
        }
        self.inner.drain();
    }

    fn on_complete(&self) {
        lock(&self.inner.state).done[self.index] = true;
        self.inner.drain();
    }
}

struct MergeSubscription<T>(Arc<MergeInner<T>>);

impl<T: Send + 'static> Subscription for MergeSubscription<T> {
    fn request(&self, n: u64) {
        {
            let mut state = lock(&self.0.state);
            if n == 0 {
                state.error.get_or_insert(StreamError::InvalidDemand(0));
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
            state.queue.clear();
        }
        self.0.cancel_sources();
        self.0.downstream.release();
    }
}
