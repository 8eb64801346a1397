// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::demand::DemandTracker;
use crate::engine::downstream::Downstream;
use crate::engine::sync::{lock, Drain};
use crate::errors::StreamError;
use crate::observability::messages::pipeline::ProtocolViolation;
use crate::observability::messages::StructuredLog;
use crate::traits::{Publisher, Subscriber, Subscription};

/// A cold publisher over a fresh iterator per subscription.
pub(crate) struct IterPublisher<F, T> {
    factory: F,
    _item: PhantomData<fn() -> T>,
}

impl<F, T> IterPublisher<F, T> {
    pub(crate) fn new(factory: F) -> Self {
        Self {
            factory,
            _item: PhantomData,
        }
    }
}

impl<F, I, T> Publisher<T> for IterPublisher<F, T>
where
    F: Fn() -> I + Send + Sync,
    I: Iterator<Item = T> + Send + 'static,
    T: Send + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        let subscription = Arc::new(IterSubscription {
            iter: Mutex::new(Some((self.factory)())),
            demand: Mutex::new(DemandTracker::new()),
            violation: Mutex::new(None),
            done: AtomicBool::new(false),
            drain: Drain::new(),
            downstream: Downstream::new(Arc::clone(&subscriber)),
        });
        subscriber.on_subscribe(subscription);
    }
}

struct IterSubscription<I, T> {
    iter: Mutex<Option<I>>,
    demand: Mutex<DemandTracker>,
    violation: Mutex<Option<StreamError>>,
    done: AtomicBool,
    drain: Drain,
    downstream: Downstream<T>,
}

impl<I, T> IterSubscription<I, T>
where
    I: Iterator<Item = T> + Send,
    T: Send,
{
    fn emit(&self) {
        loop {
            if self.done.load(Ordering::Acquire) {
                return;
            }
            let violation = lock(&self.violation).take();
            if let Some(error) = violation {
                self.finish();
                self.downstream.error(error);
                return;
            }
            if !lock(&self.demand).has_demand() {
                return;
            }

            let next = match lock(&self.iter).as_mut() {
                Some(iter) => iter.next(),
                None => return,
            };
            match next {
                Some(item) => {
                    lock(&self.demand).consume_one();
                    self.downstream.next(item);
                }
                None => {
                    self.finish();
                    self.downstream.complete();
                    return;
                }
            }
        }
    }

    fn finish(&self) {
        self.done.store(true, Ordering::Release);
        lock(&self.iter).take();
    }
}

impl<I, T> Subscription for IterSubscription<I, T>
where
    I: Iterator<Item = T> + Send,
    T: Send,
{
    fn request(&self, n: u64) {
        if n == 0 {
            ProtocolViolation {
                stage: "iter",
                reason: "request(0)",
            }
            .log();
            *lock(&self.violation) = Some(StreamError::InvalidDemand(0));
        } else {
            lock(&self.demand).add(n);
        }
        self.drain.run(|| self.emit());
    }

    fn cancel(&self) {
        self.finish();
        self.downstream.release();
    }
}
