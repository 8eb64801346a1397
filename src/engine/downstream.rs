// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Holders for the two ends every operator talks to.

use std::sync::{Arc, Mutex};

use crate::engine::sync::lock;
use crate::errors::StreamError;
use crate::traits::{Subscriber, Subscription};

/// The subscriber an operator emits to.
///
/// Terminal signals take the subscriber out of the slot, so at most one of
/// `error`/`complete` is ever delivered and nothing follows it. Releasing the
/// slot also breaks the subscriber <-> subscription reference cycle.
pub(crate) struct Downstream<T> {
    subscriber: Mutex<Option<Arc<dyn Subscriber<T>>>>,
}

impl<T> Downstream<T> {
    pub(crate) fn new(subscriber: Arc<dyn Subscriber<T>>) -> Self {
        Self {
            subscriber: Mutex::new(Some(subscriber)),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<dyn Subscriber<T>>> {
        lock(&self.subscriber).clone()
    }

    pub(crate) fn subscribe_with(&self, subscription: Arc<dyn Subscription>) {
        if let Some(subscriber) = self.get() {
            subscriber.on_subscribe(subscription);
        }
    }

    pub(crate) fn next(&self, item: T) {
        if let Some(subscriber) = self.get() {
            subscriber.on_next(item);
        }
    }

    pub(crate) fn error(&self, error: StreamError) -> bool {
        let taken = lock(&self.subscriber).take();
        match taken {
            Some(subscriber) => {
                subscriber.on_error(error);
                true
            }
            None => false,
        }
    }

    pub(crate) fn complete(&self) -> bool {
        let taken = lock(&self.subscriber).take();
        match taken {
            Some(subscriber) => {
                subscriber.on_complete();
                true
            }
            None => false,
        }
    }

    /// Drop the subscriber without signalling it (after cancellation).
    pub(crate) fn release(&self) {
        lock(&self.subscriber).take();
    }
}

struct SlotState {
    subscription: Option<Arc<dyn Subscription>>,
    pending: u64,
    cancelled: bool,
}

/// The subscription an operator pulls from.
///
/// Requests made before the upstream called `on_subscribe` are held back and
/// forwarded on arrival; a cancel that wins the race cancels the late
/// subscription immediately.
pub(crate) struct UpstreamSlot {
    state: Mutex<SlotState>,
}

impl UpstreamSlot {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                subscription: None,
                pending: 0,
                cancelled: false,
            }),
        }
    }

    pub(crate) fn set(&self, subscription: Arc<dyn Subscription>) {
        let pending = {
            let mut state = lock(&self.state);
            if state.cancelled || state.subscription.is_some() {
                None
            } else {
                state.subscription = Some(Arc::clone(&subscription));
                Some(std::mem::take(&mut state.pending))
            }
        };

        match pending {
            None => subscription.cancel(),
            Some(0) => {}
            Some(n) => subscription.request(n),
        }
    }

    pub(crate) fn request(&self, n: u64) {
        let subscription = {
            let mut state = lock(&self.state);
            if state.cancelled {
                return;
            }
            match &state.subscription {
                Some(subscription) => Arc::clone(subscription),
                None => {
                    state.pending = state.pending.saturating_add(n);
                    return;
                }
            }
        };
        subscription.request(n);
    }

    pub(crate) fn cancel(&self) {
        let subscription = {
            let mut state = lock(&self.state);
            state.cancelled = true;
            state.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }
}

/// A subscription handed out when there is nothing to pull from.
pub(crate) struct NoopSubscription;

impl Subscription for NoopSubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}

/// Deliver `error` to a subscriber that has not been subscribed yet.
pub(crate) fn reject<T>(subscriber: Arc<dyn Subscriber<T>>, error: StreamError) {
    subscriber.on_subscribe(Arc::new(NoopSubscription));
    subscriber.on_error(error);
}

/// Complete a subscriber that has not been subscribed yet.
pub(crate) fn complete_empty<T>(subscriber: Arc<dyn Subscriber<T>>) {
    subscriber.on_subscribe(Arc::new(NoopSubscription));
    subscriber.on_complete();
}
