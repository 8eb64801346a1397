// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] for emitting the event with typed fields at a fixed level.
//!
//! # Organization
//!
//! * `pipeline` - pipeline runs, stage lifecycle and protocol events
//! * `source` - source adapter registration and creation
//! * `validation` - configuration loading and validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use fluid_constructs::observability::messages::source::SourceRegistered;
//!
//! let msg = SourceRegistered { source_type: "inline" };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod pipeline;
pub mod source;
pub mod validation;

/// Emit a message as a structured tracing event or span.
pub trait StructuredLog {
    /// Log the message at its documented level.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
