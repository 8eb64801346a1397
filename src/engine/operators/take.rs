// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use crate::engine::downstream::{complete_empty, Downstream, UpstreamSlot};
use crate::engine::flow::Flow;
use crate::engine::sync::lock;
use crate::errors::StreamError;
use crate::traits::{Publisher, Subscriber, Subscription};

/// Emits the first `limit` items, then cancels upstream and completes.
pub(crate) struct TakePublisher<T> {
    upstream: Flow<T>,
    limit: u64,
}

impl<T> TakePublisher<T> {
    pub(crate) fn new(upstream: Flow<T>, limit: u64) -> Self {
        Self { upstream, limit }
    }
}

impl<T: Send + 'static> Publisher<T> for TakePublisher<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        if self.limit == 0 {
            complete_empty(subscriber);
            return;
        }
        let upstream = Arc::new(UpstreamSlot::new());
        self.upstream.subscribe(Arc::new(TakeSubscriber {
            remaining: Mutex::new(self.limit),
            subscription: Arc::new(TakeSubscription {
                upstream: Arc::clone(&upstream),
                budget: Mutex::new(self.limit),
            }),
            upstream,
            downstream: Downstream::new(subscriber),
        }));
    }
}

struct TakeSubscriber<T> {
    remaining: Mutex<u64>,
    subscription: Arc<TakeSubscription>,
    upstream: Arc<UpstreamSlot>,
    downstream: Downstream<T>,
}

/// Caps cumulative upstream demand at the take limit.
struct TakeSubscription {
    upstream: Arc<UpstreamSlot>,
    budget: Mutex<u64>,
}

impl Subscription for TakeSubscription {
    fn request(&self, n: u64) {
        let granted = {
            let mut budget = lock(&self.budget);
            let granted = n.min(*budget);
            *budget -= granted;
            granted
        };
        if n == 0 {
            self.upstream.request(0);
        } else if granted > 0 {
            self.upstream.request(granted);
        }
    }

    fn cancel(&self) {
        self.upstream.cancel();
    }
}

impl<T: Send + 'static> Subscriber<T> for TakeSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.upstream.set(subscription);
        let handle: Arc<dyn Subscription> = self.subscription.clone();
        self.downstream.subscribe_with(handle);
    }

    fn on_next(&self, item: T) {
        let last = {
            let mut remaining = lock(&self.remaining);
            if *remaining == 0 {
                return;
            }
            *remaining -= 1;
            *remaining == 0
        };
        self.downstream.next(item);
        if last {
            self.upstream.cancel();
            self.downstream.complete();
        }
    }

    fn on_error(&self, error: StreamError) {
        self.downstream.error(error);
    }

    fn on_complete(&self) {
        self.downstream.complete();
    }
}
