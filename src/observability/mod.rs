// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout Fluid Constructs. Message types follow a struct-based pattern
//! with `Display` implementations and a [`messages::StructuredLog`] implementation
//! that emits the event at its documented level with typed fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::pipeline` - pipeline runs, stage lifecycle and protocol events
//! * `messages::source` - source adapter registration and creation
//! * `messages::validation` - configuration loading and validation
//!
//! # Usage
//!
//! ```rust
//! use fluid_constructs::observability::messages::pipeline::PipelineAttached;
//! use fluid_constructs::observability::messages::StructuredLog;
//!
//! PipelineAttached {
//!     stream: "orders",
//!     sink: "list",
//! }
//! .log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "fluid_constructs=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Without `RUST_LOG` the crate logs at `info`. Calling this more than once is
/// harmless; only the first subscriber is installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
