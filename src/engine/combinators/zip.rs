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

/// Combines the k-th item of every source into round k.
///
/// Each source owns the buffer slot at its index. A round is emitted once
/// every slot holds an item; the stream completes as soon as a finished
/// source's slot runs dry, and any error discards the partial buffers.
pub(crate) struct ZipPublisher<T> {
    sources: Vec<Flow<T>>,
    prefetch: u64,
}

impl<T> ZipPublisher<T> {
    pub(crate) fn new(sources: Vec<Flow<T>>, prefetch: u64) -> Self {
        Self {
            sources,
            prefetch: prefetch.max(1),
        }
    }
}

impl<T: Send + 'static> Publisher<Vec<T>> for ZipPublisher<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<Vec<T>>>) {
        if self.sources.is_empty() {
            complete_empty(subscriber);
            return;
        }

        let width = self.sources.len();
        let inner = Arc::new(ZipInner {
            slots: (0..width).map(|_| UpstreamSlot::new()).collect(),
            prefetch: self.prefetch,
            downstream: Downstream::new(subscriber),
            state: Mutex::new(ZipState {
                buffers: (0..width).map(|_| VecDeque::new()).collect(),
                done: vec![false; width],
                demand: DemandTracker::new(),
                error: None,
                finished: false,
            }),
            drain: Drain::new(),
        });

        inner
            .downstream
            .subscribe_with(Arc::new(ZipSubscription(Arc::clone(&inner))));

        for (index, source) in self.sources.iter().enumerate() {
            source.subscribe(Arc::new(ZipSubscriber {
                inner: Arc::clone(&inner),
                index,
            }));
        }
    }
}

struct ZipState<T> {
    buffers: Vec<VecDeque<T>>,
    done: Vec<bool>,
    demand: DemandTracker,
    error: Option<StreamError>,
    finished: bool,
}

impl<T> ZipState<T> {
    fn exhausted(&self) -> bool {
        self.done
            .iter()
            .zip(&self.buffers)
            .any(|(done, buffer)| *done && buffer.is_empty())
    }

    fn round_ready(&self) -> bool {
        self.buffers.iter().all(|buffer| !buffer.is_empty())
    }

    fn clear(&mut self) {
        self.buffers.iter_mut().for_each(VecDeque::clear);
    }
}

struct ZipInner<T> {
    slots: Vec<UpstreamSlot>,
    prefetch: u64,
    downstream: Downstream<Vec<T>>,
    state: Mutex<ZipState<T>>,
    drain: Drain,
}

enum Step<T> {
    Emit(Vec<T>),
    Fail(StreamError),
    Complete,
    Idle,
}

impl<T: Send + 'static> ZipInner<T> {
    fn drain(&self) {
        self.drain.run(|| loop {
            let step = {
                let mut state = lock(&self.state);
                if state.finished {
                    Step::Idle
                } else if let Some(error) = state.error.take() {
                    state.finished = true;
                    state.clear();
                    Step::Fail(error)
                } else if state.exhausted() {
                    state.finished = true;
                    state.clear();
                    Step::Complete
                } else if state.round_ready() && state.demand.consume_one() {
                    let round = state
                        .buffers
                        .iter_mut()
                        .filter_map(VecDeque::pop_front)
                        .collect();
                    Step::Emit(round)
                } else {
                    Step::Idle
                }
            };

            match step {
                Step::Emit(round) => {
                    self.downstream.next(round);
                    for slot in &self.slots {
                        slot.request(1);
                    }
                }
                Step::Fail(error) => {
                    self.cancel_sources();
                    self.downstream.error(error);
                    return;
                }
                Step::Complete => {
                    self.cancel_sources();
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

struct ZipSubscriber<T> {
    inner: Arc<ZipInner<T>>,
    index: usize,
}

impl<T: Send + 'static> Subscriber<T> for ZipSubscriber<T> {
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
            state.buffers[self.index].push_back(item);
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

struct ZipSubscription<T>(Arc<ZipInner<T>>);

impl<T: Send + 'static> Subscription for ZipSubscription<T> {
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
            state.clear();
        }
        self.0.cancel_sources();
        self.0.downstream.release();
    }
}
