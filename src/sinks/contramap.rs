// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::marker::PhantomData;
use std::sync::Arc;

use crate::data::Data;
use crate::engine::CompletionSignal;
use crate::errors::StreamError;
use crate::observability::messages::pipeline::ItemDropped;
use crate::observability::messages::StructuredLog;
use crate::traits::Sink;

/// A sink mapping envelopes before handing them to an inner sink.
///
/// Built by [`Sink::contramap`].
pub struct ContramapSink<S, F, T> {
    inner: S,
    f: F,
    _target: PhantomData<fn() -> T>,
}

impl<S, F, T> ContramapSink<S, F, T> {
    pub fn new(inner: S, f: F) -> Self {
        Self {
            inner,
            f,
            _target: PhantomData,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S, F, T, X> Sink<X> for ContramapSink<S, F, T>
where
    S: Sink<T>,
    F: Fn(Data<X>) -> Option<Data<T>> + Send + Sync,
{
    fn dispatch(&self, data: Data<X>) -> CompletionSignal {
        match (self.f)(data) {
            Some(mapped) => self.inner.dispatch(mapped),
            None => {
                ItemDropped { stage: "contramap" }.log();
                CompletionSignal::completed()
            }
        }
    }

    fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    fn accepts_more(&self) -> bool {
        self.inner.accepts_more()
    }
}

/// A sink mapping payloads before handing them to an inner sink; metadata
/// passes through untouched.
///
/// Built by [`Sink::contramap_payload`].
pub struct ContramapPayloadSink<S, F, T> {
    inner: S,
    f: F,
    _target: PhantomData<fn() -> T>,
}

impl<S, F, T> ContramapPayloadSink<S, F, T> {
    pub fn new(inner: S, f: F) -> Self {
        Self {
            inner,
            f,
            _target: PhantomData,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S, F, T, X> Sink<X> for ContramapPayloadSink<S, F, T>
where
    S: Sink<T>,
    F: Fn(X) -> Option<T> + Send + Sync,
{
    fn dispatch(&self, data: Data<X>) -> CompletionSignal {
        let metadata = Arc::clone(data.shared_metadata());
        match (self.f)(data.into_payload()) {
            Some(payload) => self.inner.dispatch(Data::from_shared(payload, metadata)),
            None => {
                ItemDropped {
                    stage: "contramap_payload",
                }
                .log();
                CompletionSignal::completed()
            }
        }
    }

    fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    fn accepts_more(&self) -> bool {
        self.inner.accepts_more()
    }
}

/// A [`ContramapSink`] whose mapping may fail.
///
/// Built by [`Sink::try_contramap`].
pub struct TryContramapSink<S, F, T> {
    inner: S,
    f: F,
    _target: PhantomData<fn() -> T>,
}

impl<S, F, T> TryContramapSink<S, F, T> {
    pub fn new(inner: S, f: F) -> Self {
        Self {
            inner,
            f,
            _target: PhantomData,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S, F, T, X> Sink<X> for TryContramapSink<S, F, T>
where
    S: Sink<T>,
    F: Fn(Data<X>) -> anyhow::Result<Option<Data<T>>> + Send + Sync,
{
    fn dispatch(&self, data: Data<X>) -> CompletionSignal {
        match (self.f)(data) {
            Ok(Some(mapped)) => self.inner.dispatch(mapped),
            Ok(None) => {
                ItemDropped {
                    stage: "try_contramap",
                }
                .log();
                CompletionSignal::completed()
            }
            Err(err) => CompletionSignal::failed(StreamError::sink(err)),
        }
    }

    fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    fn accepts_more(&self) -> bool {
        self.inner.accepts_more()
    }
}

/// A [`ContramapPayloadSink`] whose mapping may fail.
///
/// Built by [`Sink::try_contramap_payload`].
pub struct TryContramapPayloadSink<S, F, T> {
    inner: S,
    f: F,
    _target: PhantomData<fn() -> T>,
}

impl<S, F, T> TryContramapPayloadSink<S, F, T> {
    pub fn new(inner: S, f: F) -> Self {
        Self {
            inner,
            f,
            _target: PhantomData,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S, F, T, X> Sink<X> for TryContramapPayloadSink<S, F, T>
where
    S: Sink<T>,
    F: Fn(X) -> anyhow::Result<Option<T>> + Send + Sync,
{
    fn dispatch(&self, data: Data<X>) -> CompletionSignal {
        let metadata = Arc::clone(data.shared_metadata());
        match (self.f)(data.into_payload()) {
            Ok(Some(payload)) => self.inner.dispatch(Data::from_shared(payload, metadata)),
            Ok(None) => {
                ItemDropped {
                    stage: "try_contramap_payload",
                }
                .log();
                CompletionSignal::completed()
            }
            Err(err) => CompletionSignal::failed(StreamError::sink(err)),
        }
    }

    fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    fn accepts_more(&self) -> bool {
        self.inner.accepts_more()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks;

    #[test]
    fn test_contramap_drops_odd_numbers() {
        let list = sinks::list::<i32>();
        let evens = list.clone().contramap_payload(|n: i32| (n % 2 == 0).then_some(n));

        for n in [1, 2, 3, 4] {
            let signal = evens.dispatch(Data::new(n));
            assert_eq!(signal.outcome(), Some(Ok(())));
        }

        assert_eq!(list.values(), vec![2, 4]);
    }

    #[test]
    fn test_contramap_maps_envelopes() {
        let list = sinks::list::<String>();
        let labelled = list.clone().contramap(|data: Data<u32>| {
            let label = format!("#{}", data.payload());
            Some(data.with_payload(label))
        });

        labelled.dispatch(Data::new(7).insert("origin", "test"));

        let captured = list.data();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].payload(), "#7");
        assert_eq!(captured[0].get_as::<String>("origin").as_deref(), Some("test"));
    }

    #[test]
    fn test_contramap_payload_keeps_metadata() {
        let list = sinks::list::<usize>();
        let lengths = list.clone().contramap_payload(|s: &'static str| Some(s.len()));

        lengths.dispatch(Data::new("hello").insert("k", 1));

        let captured = list.data();
        assert_eq!(*captured[0].payload(), 5);
        assert_eq!(captured[0].get_as::<i64>("k"), Some(1));
    }

    #[test]
    fn test_try_contramap_payload_failure_fails_dispatch() {
        let list = sinks::list::<u32>();
        let parsed = list
            .clone()
            .try_contramap_payload(|s: &'static str| Ok(Some(s.parse::<u32>()?)));

        assert_eq!(parsed.dispatch(Data::new("12")).outcome(), Some(Ok(())));
        let outcome = parsed.dispatch(Data::new("twelve")).outcome();

        assert!(matches!(outcome, Some(Err(StreamError::Sink(_)))));
        assert_eq!(list.values(), vec![12]);
    }

    #[test]
    fn test_try_contramap_drops_and_fails() {
        let list = sinks::list::<i32>();
        let checked = list.clone().try_contramap(|data: Data<i32>| match *data.payload() {
            n if n < 0 => anyhow::bail!("negative: {}", n),
            0 => Ok(None),
            _ => Ok(Some(data)),
        });

        assert_eq!(checked.dispatch(Data::new(0)).outcome(), Some(Ok(())));
        assert_eq!(checked.dispatch(Data::new(5)).outcome(), Some(Ok(())));
        assert_eq!(
            checked.dispatch(Data::new(-1)).outcome(),
            Some(Err(StreamError::Sink("negative: -1".to_string())))
        );
        assert_eq!(list.values(), vec![5]);
    }
}
