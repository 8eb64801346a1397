use crate::data::Data;
use crate::engine::CompletionSignal;
use crate::sinks::{
    ContramapPayloadSink, ContramapSink, TryContramapPayloadSink, TryContramapSink,
};

/// A terminal consumer of envelopes.
///
/// Each dispatch returns a `CompletionSignal`; the pipeline delivers the next
/// item only after the previous signal resolved successfully.
pub trait Sink<T>: Send + Sync {
    fn dispatch(&self, data: Data<T>) -> CompletionSignal;

    fn name(&self) -> Option<&str> {
        None
    }

    /// Whether the sink wants further items. Returning `false` makes the
    /// pipeline cancel its upstream and report success.
    fn accepts_more(&self) -> bool {
        true
    }

    /// Adapt this sink to envelopes of another type.
    ///
    /// Returning `None` from `f` drops the envelope: the dispatch resolves
    /// successfully and this sink never sees it.
    fn contramap<X, F>(self, f: F) -> ContramapSink<Self, F, T>
    where
        Self: Sized,
        F: Fn(Data<X>) -> Option<Data<T>> + Send + Sync,
    {
        ContramapSink::new(self, f)
    }

    /// Like [`Sink::contramap`], working on payloads and keeping metadata.
    fn contramap_payload<X, F>(self, f: F) -> ContramapPayloadSink<Self, F, T>
    where
        Self: Sized,
        F: Fn(X) -> Option<T> + Send + Sync,
    {
        ContramapPayloadSink::new(self, f)
    }

    /// Fallible [`Sink::contramap`]: an error from `f` fails the dispatch,
    /// and with it the run, with `StreamError::Sink`.
    fn try_contramap<X, F>(self, f: F) -> TryContramapSink<Self, F, T>
    where
        Self: Sized,
        F: Fn(Data<X>) -> anyhow::Result<Option<Data<T>>> + Send + Sync,
    {
        TryContramapSink::new(self, f)
    }

    fn try_contramap_payload<X, F>(self, f: F) -> TryContramapPayloadSink<Self, F, T>
    where
        Self: Sized,
        F: Fn(X) -> anyhow::Result<Option<T>> + Send + Sync,
    {
        TryContramapPayloadSink::new(self, f)
    }
}
