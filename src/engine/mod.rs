// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The reactive dataflow engine: demand-driven flows, their operators and
//! combinators, and the envelope pipeline built on top of them.

pub(crate) mod combinators;
pub mod completion;
pub mod demand;
pub(crate) mod downstream;
pub mod flow;
pub(crate) mod operators;
pub mod stream;
pub(crate) mod sync;
pub(crate) mod terminal;


pub use completion::{CompletionSignal, Outcome};
pub use demand::{Demand, DemandTracker};
pub use flow::Flow;
pub use stream::{DataStream, Source};
