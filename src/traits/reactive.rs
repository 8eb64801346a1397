use std::sync::Arc;

use crate::errors::StreamError;

/// The capability a subscriber uses to pull items from its producer.
///
/// Both methods may be called from any thread, including from inside
/// `on_next` of the same subscriber.
pub trait Subscription: Send + Sync {
    /// Signal willingness to receive up to `n` more items.
    ///
    /// `n == 0` is a protocol violation; the producer cancels and reports
    /// `StreamError::InvalidDemand` through `on_error`.
    fn request(&self, n: u64);

    /// Irrevocably stop delivery. Signals already in flight may still arrive.
    fn cancel(&self);
}

/// A consumer of a reactive sequence.
///
/// Signals arrive serially: `on_subscribe` first, then any number of
/// `on_next` bounded by cumulative demand, then at most one of
/// `on_error` / `on_complete`.
pub trait Subscriber<T>: Send + Sync {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    fn on_next(&self, item: T);

    fn on_error(&self, error: StreamError);

    fn on_complete(&self);
}

/// A producer of a reactive sequence.
///
/// Every call to `subscribe` starts an independent run; fan-out to several
/// subscribers over one run goes through `Flow::broadcast`.
pub trait Publisher<T>: Send + Sync {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>);
}
