// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Terminal consumers of envelopes.
//!
//! Every sink here is a cheap handle over shared state: clone it before
//! passing it to `DataStream::to` to read its contents afterwards.

mod cache;
mod contramap;
mod file;
mod fold;
mod for_each;
mod head;
mod list;
mod tail;

use std::future::Future;
use std::path::PathBuf;

use crate::data::Data;

pub use cache::CacheSink;
pub use contramap::{
    ContramapPayloadSink, ContramapSink, TryContramapPayloadSink, TryContramapSink,
};
pub use file::FileSink;
pub use fold::FoldSink;
pub use for_each::{DiscardSink, ForEachAsyncSink, ForEachSink, TryForEachSink};
pub use head::HeadSink;
pub use list::ListSink;
pub use tail::TailSink;

/// A sink calling `f` for every envelope.
pub fn for_each<T, F>(f: F) -> ForEachSink<F>
where
    F: Fn(Data<T>) + Send + Sync,
{
    ForEachSink::new(f)
}

/// A sink calling a fallible `f` for every envelope; the first error fails
/// the run.
pub fn try_for_each<T, F>(f: F) -> TryForEachSink<F>
where
    F: Fn(Data<T>) -> anyhow::Result<()> + Send + Sync,
{
    TryForEachSink::new(f)
}

/// A sink whose dispatch is the future returned by `f`.
pub fn for_each_async<T, F, Fut>(f: F) -> ForEachAsyncSink<F>
where
    F: Fn(Data<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    ForEachAsyncSink::new(f)
}

/// A sink accepting and dropping everything.
pub fn discard() -> DiscardSink {
    DiscardSink
}

pub fn list<T>() -> ListSink<T> {
    ListSink::new()
}

pub fn cache<T>() -> CacheSink<T> {
    CacheSink::new()
}

/// A sink reducing every payload into one accumulator, starting at `seed`.
pub fn fold<T, A, F>(seed: A, reducer: F) -> FoldSink<A, F>
where
    F: Fn(T, A) -> A + Send + Sync,
{
    FoldSink::new(seed, reducer)
}

pub fn head<T>() -> HeadSink<T> {
    HeadSink::new()
}

pub fn tail<T>() -> TailSink<T> {
    TailSink::new()
}

/// A sink appending each payload as a line to the file at `path`.
pub fn file(path: impl Into<PathBuf>) -> FileSink {
    FileSink::new(path)
}
