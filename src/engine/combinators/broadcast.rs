// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use crate::engine::demand::DemandTracker;
use crate::engine::downstream::{reject, UpstreamSlot};
use crate::engine::flow::Flow;
use crate::engine::sync::lock;
use crate::errors::StreamError;
use crate::observability::messages::pipeline::BroadcastConnected;
use crate::observability::messages::StructuredLog;
use crate::traits::{Publisher, Subscriber, Subscription};

/// Shared fan-out point behind the branches of one broadcast.
///
/// The upstream is subscribed once, when every branch has either subscribed
/// or been cancelled. Upstream demand never exceeds the smallest outstanding
/// demand across live branches, so every item can be handed to every branch.
pub(crate) struct BroadcastHub<T> {
    upstream: Flow<T>,
    slot: Arc<UpstreamSlot>,
    state: Mutex<HubState<T>>,
}

struct Branch<T> {
    subscriber: Option<Arc<dyn Subscriber<T>>>,
    demand: DemandTracker,
    subscribed: bool,
    cancelled: bool,
}

enum Terminal {
    Error(StreamError),
    Complete,
}

struct HubState<T> {
    branches: Vec<Branch<T>>,
    /// Requested from upstream and not yet received.
    in_flight: u64,
    connected: bool,
    terminal: Option<Terminal>,
}

impl<T: Clone + Send + 'static> BroadcastHub<T> {
    pub(crate) fn new(upstream: Flow<T>, branches: usize) -> Arc<Self> {
        Arc::new(Self {
            upstream,
            slot: Arc::new(UpstreamSlot::new()),
            state: Mutex::new(HubState {
                branches: (0..branches)
                    .map(|_| Branch {
                        subscriber: None,
                        demand: DemandTracker::new(),
                        subscribed: false,
                        cancelled: false,
                    })
                    .collect(),
                in_flight: 0,
                connected: false,
                terminal: None,
            }),
        })
    }

    /// One flow per branch.
    pub(crate) fn branches(self: &Arc<Self>) -> Vec<Flow<T>> {
        let count = lock(&self.state).branches.len();
        (0..count)
            .map(|index| {
                Flow::from_publisher(BranchPublisher {
                    hub: Arc::clone(self),
                    index,
                })
            })
            .collect()
    }

    fn attach(self: &Arc<Self>, index: usize, subscriber: Arc<dyn Subscriber<T>>) {
        {
            let mut state = lock(&self.state);
            let branch = &mut state.branches[index];
            if branch.subscribed {
                drop(state);
                reject(
                    subscriber,
                    StreamError::AlreadySubscribed(format!("broadcast branch {}", index)),
                );
                return;
            }
            branch.subscribed = true;
            branch.subscriber = Some(Arc::clone(&subscriber));
        }

        subscriber.on_subscribe(Arc::new(BranchSubscription {
            hub: Arc::clone(self),
            index,
        }));
        self.connect_when_ready();
    }

    fn connect_when_ready(self: &Arc<Self>) {
        let branch_count = {
            let mut state = lock(&self.state);
            let ready = state
                .branches
                .iter()
                .all(|branch| branch.subscribed || branch.cancelled);
            if state.connected || !ready {
                return;
            }
            state.connected = true;
            state.branches.len()
        };

        BroadcastConnected {
            branches: branch_count,
        }
        .log();
        self.upstream.subscribe(Arc::new(HubSubscriber {
            hub: Arc::clone(self),
        }));
        self.request_more();
    }

    /// Top up upstream demand to the slowest live branch's outstanding demand.
    fn request_more(&self) {
        let delta = {
            let mut state = lock(&self.state);
            if !state.connected || state.terminal.is_some() {
                return;
            }
            let slowest = state
                .branches
                .iter()
                .filter(|branch| !branch.cancelled)
                .map(|branch| branch.demand.current().as_request())
                .min();
            match slowest {
                Some(slowest) if slowest > state.in_flight => {
                    let delta = slowest - state.in_flight;
                    state.in_flight = slowest;
                    delta
                }
                _ => return,
            }
        };
        self.slot.request(delta);
    }

    fn request(self: &Arc<Self>, index: usize, n: u64) {
        if n == 0 {
            let subscriber = lock(&self.state).branches[index].subscriber.take();
            self.cancel(index);
            if let Some(subscriber) = subscriber {
                subscriber.on_error(StreamError::InvalidDemand(0));
            }
            return;
        }
        {
            let mut state = lock(&self.state);
            let branch = &mut state.branches[index];
            if branch.cancelled {
                return;
            }
            branch.demand.add(n);
        }
        self.request_more();
    }

    fn cancel(self: &Arc<Self>, index: usize) {
        let all_cancelled = {
            let mut state = lock(&self.state);
            let branch = &mut state.branches[index];
            branch.cancelled = true;
            branch.subscriber = None;
            state.branches.iter().all(|branch| branch.cancelled)
        };

        if all_cancelled {
            self.slot.cancel();
        } else {
            self.connect_when_ready();
            self.request_more();
        }
    }

    fn deliver(&self, item: T) {
        let targets: Vec<Arc<dyn Subscriber<T>>> = {
            let mut state = lock(&self.state);
            if state.terminal.is_some() {
                return;
            }
            state.in_flight = state.in_flight.saturating_sub(1);
            state
                .branches
                .iter_mut()
                .filter(|branch| !branch.cancelled)
                .filter_map(|branch| {
                    branch.demand.consume_one();
                    branch.subscriber.clone()
                })
                .collect()
        };

        for target in targets {
            target.on_next(item.clone());
        }
    }

    fn terminate(&self, terminal: Terminal) {
        let targets: Vec<Arc<dyn Subscriber<T>>> = {
            let mut state = lock(&self.state);
            if state.terminal.is_some() {
                return;
            }
            let targets = state
                .branches
                .iter_mut()
                .filter_map(|branch| branch.subscriber.take())
                .collect();
            state.terminal = Some(match &terminal {
                Terminal::Error(error) => Terminal::Error(error.clone()),
                Terminal::Complete => Terminal::Complete,
            });
            targets
        };

        for target in targets {
            match &terminal {
                Terminal::Error(error) => target.on_error(error.clone()),
                Terminal::Complete => target.on_complete(),
            }
        }
    }
}

struct BranchPublisher<T> {
    hub: Arc<BroadcastHub<T>>,
    index: usize,
}

impl<T: Clone + Send + 'static> Publisher<T> for BranchPublisher<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        self.hub.attach(self.index, subscriber);
    }
}

struct BranchSubscription<T> {
    hub: Arc<BroadcastHub<T>>,
    index: usize,
}

impl<T: Clone + Send + 'static> Subscription for BranchSubscription<T> {
    fn request(&self, n: u64) {
        self.hub.request(self.index, n);
    }

    fn cancel(&self) {
        self.hub.cancel(self.index);
    }
}

struct HubSubscriber<T> {
    hub: Arc<BroadcastHub<T>>,
}

impl<T: Clone + Send + 'static> Subscriber<T> for HubSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.hub.slot.set(subscription);
    }

    fn on_next(&self, item: T) {
        self.hub.deliver(item);
    }

    fn on_error(&self, error: StreamError) {
        self.hub.terminate(Terminal::Error(error));
    }

    fn on_complete(&self) {
        self.hub.terminate(Terminal::Complete);
    }
}
