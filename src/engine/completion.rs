// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::engine::sync::lock;
use crate::errors::StreamError;

/// The result carried by a resolved `CompletionSignal`.
pub type Outcome = Result<(), StreamError>;

type Continuation = Box<dyn FnOnce(&Outcome) + Send>;

enum SignalState {
    Pending {
        continuations: Vec<Continuation>,
        wakers: Vec<Waker>,
    },
    Resolved(Outcome),
}

/// A one-shot, write-once success/failure result.
///
/// The first of `complete` / `fail` wins and later attempts are no-ops.
/// Continuations registered with [`CompletionSignal::on_resolved`] fire
/// exactly once, and the signal can also be `.await`ed any number of times
/// through its clones.
///
/// # Example
/// ```
/// use fluid_constructs::engine::CompletionSignal;
///
/// let signal = CompletionSignal::new();
/// assert!(signal.complete());
/// assert!(!signal.fail(fluid_constructs::errors::StreamError::Sink("late".into())));
/// assert_eq!(signal.outcome(), Some(Ok(())));
/// ```
#[derive(Clone)]
pub struct CompletionSignal {
    state: Arc<Mutex<SignalState>>,
}

impl CompletionSignal {
    /// A pending signal.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SignalState::Pending {
                continuations: Vec::new(),
                wakers: Vec::new(),
            })),
        }
    }

    /// A signal already resolved successfully.
    pub fn completed() -> Self {
        Self::resolved(Ok(()))
    }

    /// A signal already resolved with `error`.
    pub fn failed(error: StreamError) -> Self {
        Self::resolved(Err(error))
    }

    fn resolved(outcome: Outcome) -> Self {
        Self {
            state: Arc::new(Mutex::new(SignalState::Resolved(outcome))),
        }
    }

    /// Run `future` on the current tokio runtime and resolve with its output.
    ///
    /// Outside a runtime the signal fails with `StreamError::NoRuntime`.
    pub fn spawn<F>(stage: &str, future: F) -> Self
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let signal = Self::new();
                let resolver = signal.clone();
                handle.spawn(async move {
                    resolver.resolve(future.await);
                });
                signal
            }
            Err(_) => Self::failed(StreamError::NoRuntime(stage.to_string())),
        }
    }

    /// Resolve the signal. Returns `true` if this call won the race.
    pub fn resolve(&self, outcome: Outcome) -> bool {
        let previous = {
            let mut state = lock(&self.state);
            if let SignalState::Resolved(_) = &*state {
                return false;
            }
            let previous = std::mem::replace(&mut *state, SignalState::Resolved(outcome.clone()));
            previous
        };
        let SignalState::Pending {
            continuations,
            wakers,
        } = previous
        else {
            return false;
        };

        for continuation in continuations {
            continuation(&outcome);
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    pub fn complete(&self) -> bool {
        self.resolve(Ok(()))
    }

    pub fn fail(&self, error: StreamError) -> bool {
        self.resolve(Err(error))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*lock(&self.state), SignalState::Resolved(_))
    }

    /// The outcome, if resolved.
    pub fn outcome(&self) -> Option<Outcome> {
        match &*lock(&self.state) {
            SignalState::Resolved(outcome) => Some(outcome.clone()),
            SignalState::Pending { .. } => None,
        }
    }

    /// Attach a continuation. Runs inline when the signal is already resolved,
    /// otherwise on the thread that resolves it.
    pub fn on_resolved(&self, continuation: impl FnOnce(&Outcome) + Send + 'static) {
        let outcome = {
            let mut state = lock(&self.state);
            match &mut *state {
                SignalState::Pending { continuations, .. } => {
                    continuations.push(Box::new(continuation));
                    return;
                }
                SignalState::Resolved(outcome) => outcome.clone(),
            }
        };
        continuation(&outcome);
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("outcome", &self.outcome())
            .finish()
    }
}

impl Future for CompletionSignal {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = lock(&self.state);
        match &mut *state {
            SignalState::Resolved(outcome) => Poll::Ready(outcome.clone()),
            SignalState::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[test]
    fn first_resolution_wins() {
        let signal = CompletionSignal::new();
        assert!(signal.fail(StreamError::Sink("boom".to_string())));
        assert!(!signal.complete());
        assert_eq!(
            signal.outcome(),
            Some(Err(StreamError::Sink("boom".to_string())))
        );
    }

    #[test]
    fn continuations_fire_exactly_once() {
        let signal = CompletionSignal::new();
        let fired = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            signal.on_resolved(move |outcome| {
                assert!(outcome.is_ok());
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        signal.complete();
        signal.complete();
        assert_eq!(fired.load(Ordering::SeqCst), 3);

        let late = Arc::clone(&fired);
        signal.on_resolved(move |_| {
            late.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn spawn_without_runtime_fails() {
        let signal = CompletionSignal::spawn("test-stage", async { Ok(()) });
        assert_eq!(
            signal.outcome(),
            Some(Err(StreamError::NoRuntime("test-stage".to_string())))
        );
    }

    #[tokio::test]
    async fn awaiting_clones_observe_the_same_outcome() {
        let signal = CompletionSignal::spawn("sleepy", async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Err(StreamError::Source("gone".to_string()))
        });

        let other = signal.clone();
        let (a, b) = tokio::join!(signal, other);
        assert_eq!(a, Err(StreamError::Source("gone".to_string())));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn concurrent_resolvers_resolve_once() {
        let signal = CompletionSignal::new();
        let winners = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let signal = signal.clone();
            let winners = Arc::clone(&winners);
            handles.push(tokio::spawn(async move {
                let outcome = if i % 2 == 0 {
                    Ok(())
                } else {
                    Err(StreamError::Sink(format!("writer {}", i)))
                };
                if signal.resolve(outcome) {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(signal.is_resolved());
    }
}
