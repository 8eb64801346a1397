// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Payload carriers: the metadata envelope and the combined values produced
//! by zip rounds.

mod envelope;
mod tuple;

pub use envelope::{Data, Metadata};
pub use tuple::{Pair, Tuple};
