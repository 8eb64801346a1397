// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // config + validation
pub mod data;       // envelope, pair, tuple
pub mod engine;     // flows, operators, combinators, pipelines
pub mod errors;     // error handling
pub mod observability;
pub mod sinks;      // terminal consumers
pub mod sources;    // source adapters
pub mod traits;     // reactive contracts, sink, source factory
