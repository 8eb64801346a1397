// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::consts::DEFAULT_PREFETCH;
use crate::engine::combinators::broadcast::BroadcastHub;
use crate::engine::combinators::concat::ConcatPublisher;
use crate::engine::combinators::merge::MergePublisher;
use crate::engine::combinators::zip::ZipPublisher;
use crate::engine::completion::CompletionSignal;
use crate::engine::downstream::reject;
use crate::engine::operators::async_stage::{AsyncStagePublisher, StepFuture};
use crate::engine::operators::flat_map::FlatMapIterPublisher;
use crate::engine::operators::iter_source::IterPublisher;
use crate::engine::operators::map::{MapPublisher, StepResult};
use crate::engine::operators::take::TakePublisher;
use crate::engine::sync::lock;
use crate::errors::StreamError;
use crate::traits::{Publisher, Subscriber, Subscription};

/// A lazy, cold reactive sequence.
///
/// `Flow` is a cheap handle around a shared [`Publisher`]; operators return
/// new flows wrapping the previous one and nothing runs until something
/// subscribes. Every subscription is an independent run.
///
/// # Example
/// ```
/// use fluid_constructs::engine::Flow;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let squares = Flow::from_items(vec![1, 2, 3, 4])
///     .filter(|n| n % 2 == 0)
///     .map(|n| n * n);
///
/// assert_eq!(runtime.block_on(squares.collect()).unwrap(), vec![4, 16]);
/// ```
pub struct Flow<T> {
    publisher: Arc<dyn Publisher<T>>,
}

impl<T> Clone for Flow<T> {
    fn clone(&self) -> Self {
        Self {
            publisher: Arc::clone(&self.publisher),
        }
    }
}

struct FailedPublisher {
    error: StreamError,
}

impl<T> Publisher<T> for FailedPublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        reject(subscriber, self.error.clone());
    }
}

impl<T: Send + 'static> Flow<T> {
    pub fn from_publisher(publisher: impl Publisher<T> + 'static) -> Self {
        Self {
            publisher: Arc::new(publisher),
        }
    }

    /// Emit the items of a cloneable collection; each run iterates a fresh clone.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        I::IntoIter: Send + 'static,
    {
        Self::from_factory(move || items.clone())
    }

    /// Emit the items produced by `factory`, called once per run.
    pub fn from_factory<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_publisher(IterPublisher::new(move || factory().into_iter()))
    }

    pub fn empty() -> Self {
        Self::from_factory(std::iter::empty)
    }

    /// A flow that fails every subscriber right away.
    pub fn failed(error: StreamError) -> Self {
        Self::from_publisher(FailedPublisher { error })
    }

    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        self.publisher.subscribe(subscriber);
    }

    pub(crate) fn step<U, F>(&self, stage: &'static str, f: F) -> Flow<U>
    where
        U: Send + 'static,
        F: Fn(T) -> StepResult<U> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.stateful_step(stage, move || {
            let f = Arc::clone(&f);
            move |item: T| f(item)
        })
    }

    pub(crate) fn stateful_step<U, M, S>(&self, stage: &'static str, make_step: M) -> Flow<U>
    where
        U: Send + 'static,
        M: Fn() -> S + Send + Sync + 'static,
        S: FnMut(T) -> StepResult<U> + Send + 'static,
    {
        Flow::from_publisher(MapPublisher::new(self.clone(), stage, make_step))
    }

    pub fn map<U, F>(&self, f: F) -> Flow<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.step("map", move |item| Ok(Some(f(item))))
    }

    /// Map with a fallible function; the first failure becomes the flow's error.
    pub fn try_map<U, F>(&self, f: F) -> Flow<U>
    where
        U: Send + 'static,
        F: Fn(T) -> anyhow::Result<U> + Send + Sync + 'static,
    {
        self.step("try_map", move |item| {
            f(item).map(Some).map_err(StreamError::transform)
        })
    }

    pub fn filter<P>(&self, predicate: P) -> Flow<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.step("filter", move |item| {
            Ok(if predicate(&item) { Some(item) } else { None })
        })
    }

    /// Map and drop in one step; `None` drops the item.
    pub fn filter_map<U, F>(&self, f: F) -> Flow<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        self.step("filter_map", move |item| Ok(f(item)))
    }

    /// Emit the running accumulator after every item.
    ///
    /// The seed itself is not emitted; every run starts again from `seed`.
    pub fn scan<A, F>(&self, seed: A, f: F) -> Flow<A>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, T) -> A + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.stateful_step("scan", move || {
            let f = Arc::clone(&f);
            let mut acc = seed.clone();
            move |item: T| {
                acc = f(acc.clone(), item);
                Ok(Some(acc.clone()))
            }
        })
    }

    /// Drop items equal to one already emitted in this run.
    pub fn distinct(&self) -> Flow<T>
    where
        T: Clone + Eq + Hash,
    {
        self.stateful_step("distinct", || {
            let mut seen = HashSet::new();
            move |item: T| Ok(if seen.insert(item.clone()) { Some(item) } else { None })
        })
    }

    /// Emit at most `limit` items, then cancel upstream and complete.
    pub fn take(&self, limit: u64) -> Flow<T> {
        Flow::from_publisher(TakePublisher::new(self.clone(), limit))
    }

    /// Expand every item into a sequence, keeping order and respecting demand.
    pub fn flat_map_iter<U, I, F>(&self, f: F) -> Flow<U>
    where
        U: Send + 'static,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        Flow::from_publisher(FlatMapIterPublisher::new(self.clone(), f))
    }

    /// Map through an asynchronous function, one item in flight, order kept.
    ///
    /// Requires a tokio runtime when subscribed.
    pub fn map_async<U, F, Fut>(&self, f: F) -> Flow<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<U>> + Send + 'static,
    {
        Flow::from_publisher(AsyncStagePublisher::new(
            self.clone(),
            "map_async",
            move |item: T| -> StepFuture<U> {
                let pending = f(item);
                Box::pin(async move { pending.await.map(Some).map_err(StreamError::transform) })
            },
        ))
    }

    /// Shift every item by `duration` from the moment it arrives. Order is kept.
    ///
    /// Requires a tokio runtime when subscribed.
    pub fn delay(&self, duration: Duration) -> Flow<T> {
        Flow::from_publisher(AsyncStagePublisher::new(
            self.clone(),
            "delay",
            move |item: T| -> StepFuture<T> {
                let deadline = tokio::time::Instant::now() + duration;
                Box::pin(async move {
                    tokio::time::sleep_until(deadline).await;
                    Ok(Some(item))
                })
            },
        ))
    }

    /// Interleave all flows in arrival order.
    pub fn merge(flows: Vec<Flow<T>>, prefetch: u64) -> Flow<T> {
        Flow::from_publisher(MergePublisher::new(flows, prefetch))
    }

    pub fn merge_with(&self, others: impl IntoIterator<Item = Flow<T>>) -> Flow<T> {
        Self::merge(self.with_others(others), DEFAULT_PREFETCH)
    }

    /// Run the flows one after another.
    pub fn concat(flows: Vec<Flow<T>>) -> Flow<T> {
        Flow::from_publisher(ConcatPublisher::new(flows))
    }

    pub fn concat_with(&self, others: impl IntoIterator<Item = Flow<T>>) -> Flow<T> {
        Self::concat(self.with_others(others))
    }

    /// Pair the k-th items of all flows into round k.
    pub fn zip(flows: Vec<Flow<T>>, prefetch: u64) -> Flow<Vec<T>> {
        Flow::from_publisher(ZipPublisher::new(flows, prefetch))
    }

    /// Split into `branches` flows that each see every item.
    ///
    /// Upstream is subscribed once every branch has subscribed or cancelled,
    /// and runs at the pace of the slowest branch. Each branch accepts a
    /// single subscriber.
    pub fn broadcast(&self, branches: usize) -> Vec<Flow<T>>
    where
        T: Clone,
    {
        BroadcastHub::new(self.clone(), branches).branches()
    }

    /// Run the flow with unbounded demand and gather every item.
    pub async fn collect(&self) -> Result<Vec<T>, StreamError> {
        let collector = Arc::new(Collector {
            items: Mutex::new(Vec::new()),
            signal: CompletionSignal::new(),
        });
        self.subscribe(collector.clone());
        collector.signal.clone().await?;
        let items = std::mem::take(&mut *lock(&collector.items));
        Ok(items)
    }

    fn with_others(&self, others: impl IntoIterator<Item = Flow<T>>) -> Vec<Flow<T>> {
        std::iter::once(self.clone()).chain(others).collect()
    }
}

struct Collector<T> {
    items: Mutex<Vec<T>>,
    signal: CompletionSignal,
}

impl<T: Send> Subscriber<T> for Collector<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        subscription.request(u64::MAX);
    }

    fn on_next(&self, item: T) {
        lock(&self.items).push(item);
    }

    fn on_error(&self, error: StreamError) {
        self.signal.fail(error);
    }

    fn on_complete(&self) {
        self.signal.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_scan_emits_running_factorial() {
        let factorials = Flow::from_items(1..=10u64)
            .scan(1u64, |acc, n| acc * n)
            .collect()
            .await
            .unwrap();

        assert_eq!(factorials.len(), 10);
        assert_eq!(factorials[0], 1);
        assert_eq!(factorials[9], 3_628_800);
    }

    #[tokio::test]
    async fn test_scan_restarts_from_seed_per_run() {
        let sums = Flow::from_items(vec![1, 2, 3]).scan(0, |acc, n| acc + n);

        assert_eq!(sums.collect().await.unwrap(), vec![1, 3, 6]);
        assert_eq!(sums.collect().await.unwrap(), vec![1, 3, 6]);
    }

    #[tokio::test]
    async fn test_distinct_keeps_first_occurrence() {
        let authors = Flow::from_items(vec!["rand", "gelardi", "atwood", "gelardi", "rand"])
            .distinct()
            .collect()
            .await
            .unwrap();

        assert_eq!(authors, vec!["rand", "gelardi", "atwood"]);
    }

    #[tokio::test]
    async fn test_take_bounds_an_infinite_source() {
        let first = Flow::from_factory(|| 0u64..).take(3).collect().await.unwrap();
        assert_eq!(first, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_take_zero_completes_without_items() {
        let none = Flow::from_items(vec![1, 2]).take(0).collect().await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_flat_map_iter_expands_in_order() {
        let words = Flow::from_items(vec!["attitude is", "everything"])
            .flat_map_iter(|quote: &str| quote.split(' ').map(str::to_string).collect::<Vec<_>>())
            .collect()
            .await
            .unwrap();

        assert_eq!(words, vec!["attitude", "is", "everything"]);
    }

    #[tokio::test]
    async fn test_map_async_preserves_order() {
        let delays = Flow::from_items(vec![30u64, 5, 15])
            .map_async(|ms| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(ms)
            })
            .collect()
            .await
            .unwrap();

        assert_eq!(delays, vec![30, 5, 15]);
    }

    #[tokio::test]
    async fn test_map_async_failure_halts_flow() {
        let result = Flow::from_items(vec![1, 2, 3])
            .map_async(|n| async move {
                if n == 2 {
                    anyhow::bail!("cannot handle {}", n);
                }
                Ok(n)
            })
            .collect()
            .await;

        assert_eq!(result, Err(StreamError::Transform("cannot handle 2".to_string())));
    }

    #[tokio::test]
    async fn test_delay_keeps_order() {
        let delayed = Flow::from_items(vec!['a', 'b', 'c'])
            .delay(Duration::from_millis(5))
            .collect()
            .await
            .unwrap();

        assert_eq!(delayed, vec!['a', 'b', 'c']);
    }

    #[tokio::test]
    async fn test_try_map_error_is_terminal() {
        let result = Flow::from_items(vec![1, 2, 3])
            .try_map(|n| {
                if n == 2 {
                    Err(anyhow::anyhow!("boom"))
                } else {
                    Ok(n)
                }
            })
            .collect()
            .await;

        assert_eq!(result, Err(StreamError::Transform("boom".to_string())));
    }

    #[tokio::test]
    async fn test_merge_delivers_every_item() {
        let letters = Flow::from_items(vec!["a", "b", "c"]).delay(Duration::from_millis(2));
        let foos = Flow::from_items(vec!["foo", "foo", "foo"]);

        let mut merged = Flow::merge(vec![letters, foos], 2).collect().await.unwrap();
        merged.sort();

        assert_eq!(merged, vec!["a", "b", "c", "foo", "foo", "foo"]);
    }

    #[tokio::test]
    async fn test_merge_keeps_per_source_order() {
        let evens = Flow::from_items(vec![0, 2, 4, 6]);
        let odds = Flow::from_items(vec![1, 3, 5, 7]);

        let merged = evens.merge_with([odds]).collect().await.unwrap();
        let evens_seen: Vec<i32> = merged.iter().copied().filter(|n| n % 2 == 0).collect();
        let odds_seen: Vec<i32> = merged.iter().copied().filter(|n| n % 2 == 1).collect();

        assert_eq!(evens_seen, vec![0, 2, 4, 6]);
        assert_eq!(odds_seen, vec![1, 3, 5, 7]);
    }

    #[tokio::test]
    async fn test_merge_first_error_wins() {
        let ok = Flow::from_items(vec![1, 2, 3]);
        let failing = Flow::failed(StreamError::Source("disk gone".to_string()));

        let result = Flow::merge(vec![ok, failing], DEFAULT_PREFETCH).collect().await;
        assert_eq!(result, Err(StreamError::Source("disk gone".to_string())));
    }

    #[tokio::test]
    async fn test_concat_is_sequential_despite_delays() {
        let slow = Flow::from_items(vec!["A", "B", "C"]).delay(Duration::from_millis(10));
        let fast = Flow::from_items(vec!["FOO", "FOO", "FOO"]);

        let all = slow.concat_with([fast]).collect().await.unwrap();
        assert_eq!(all, vec!["A", "B", "C", "FOO", "FOO", "FOO"]);
    }

    #[tokio::test]
    async fn test_concat_never_subscribes_after_failure() {
        let subscribed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&subscribed);
        let later = Flow::from_factory(move || {
            flag.store(true, Ordering::SeqCst);
            vec![9]
        });
        let failing = Flow::from_items(vec![1])
            .concat_with([Flow::failed(StreamError::Source("gone".to_string()))]);

        let result = Flow::concat(vec![failing, later]).collect().await;

        assert_eq!(result, Err(StreamError::Source("gone".to_string())));
        assert!(!subscribed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_concat_of_nothing_completes() {
        let all: Vec<i32> = Flow::concat(vec![]).collect().await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_zip_pairs_by_position_and_stops_at_shortest() {
        let short = Flow::from_items(vec![1, 2, 3]);
        let long = Flow::from_items(vec![10, 20, 30, 40, 50]);

        let rounds = Flow::zip(vec![short, long], 2).collect().await.unwrap();
        assert_eq!(rounds, vec![vec![1, 10], vec![2, 20], vec![3, 30]]);
    }

    #[tokio::test]
    async fn test_zip_error_discards_partial_rounds() {
        let ok = Flow::from_items(vec![1, 2]);
        let failing = Flow::from_items(vec![7]).concat_with([Flow::failed(
            StreamError::Source("bad".to_string()),
        )]);

        let result = Flow::zip(vec![ok, failing], 4).collect().await;
        assert_eq!(result, Err(StreamError::Source("bad".to_string())));
    }

    #[tokio::test]
    async fn test_broadcast_branches_see_every_item() {
        let branches = Flow::from_items(1..=5).broadcast(2);
        let (left, right) = tokio::join!(branches[0].collect(), branches[1].collect());

        assert_eq!(left.unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(right.unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_broadcast_branch_accepts_one_subscriber() {
        let branches = Flow::from_items(vec![1]).broadcast(1);
        assert_eq!(branches[0].collect().await.unwrap(), vec![1]);

        let again = branches[0].collect().await;
        assert!(matches!(again, Err(StreamError::AlreadySubscribed(_))));
    }

    #[tokio::test]
    async fn test_flow_is_cold() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let flow = Flow::from_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![1, 2]
        });

        assert_eq!(flow.collect().await.unwrap(), vec![1, 2]);
        assert_eq!(flow.collect().await.unwrap(), vec![1, 2]);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
