// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline runs and stage lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Attaching a sink and the outcome of the resulting run
//! * Items dropped by filtering or contramapping stages
//! * Async stage workers, stage cancellation and broadcast connection
//! * Backpressure protocol violations

use crate::errors::StreamError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A sink was attached to a stream and a run started.
///
/// # Log Level
/// `debug!` - Per-run lifecycle event
pub struct PipelineAttached<'a> {
    pub stream: &'a str,
    pub sink: &'a str,
}

impl Display for PipelineAttached<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Attached sink '{}' to stream '{}'", self.sink, self.stream)
    }
}

impl StructuredLog for PipelineAttached<'_> {
    fn log(&self) {
        tracing::debug!(stream = self.stream, sink = self.sink, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "pipeline",
            span_name = name,
            stream = self.stream,
            sink = self.sink,
        )
    }
}

/// A run completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use fluid_constructs::observability::messages::pipeline::PipelineCompleted;
/// use std::time::Duration;
///
/// let msg = PipelineCompleted {
///     stream: "orders",
///     sink: "list",
///     items: 42,
///     duration: Duration::from_millis(12),
/// };
///
/// assert_eq!(msg.to_string(), "Stream 'orders' completed into sink 'list': 42 items in 12ms");
/// ```
pub struct PipelineCompleted<'a> {
    pub stream: &'a str,
    pub sink: &'a str,
    pub items: u64,
    pub duration: Duration,
}

impl Display for PipelineCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stream '{}' completed into sink '{}': {} items in {:?}",
            self.stream, self.sink, self.items, self.duration
        )
    }
}

impl StructuredLog for PipelineCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            stream = self.stream,
            sink = self.sink,
            items = self.items,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_completed",
            span_name = name,
            stream = self.stream,
            sink = self.sink,
            items = self.items,
            duration = ?self.duration,
        )
    }
}

/// A run failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct PipelineFailed<'a> {
    pub stream: &'a str,
    pub sink: &'a str,
    pub items: u64,
    pub error: &'a StreamError,
}

impl Display for PipelineFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stream '{}' failed into sink '{}' after {} items: {}",
            self.stream, self.sink, self.items, self.error
        )
    }
}

impl StructuredLog for PipelineFailed<'_> {
    fn log(&self) {
        tracing::error!(
            stream = self.stream,
            sink = self.sink,
            items = self.items,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "pipeline_failed",
            span_name = name,
            stream = self.stream,
            sink = self.sink,
            error = %self.error,
        )
    }
}

/// A stage dropped an item instead of forwarding it.
///
/// # Log Level
/// `trace!` - Per-item detail
pub struct ItemDropped<'a> {
    pub stage: &'a str,
}

impl Display for ItemDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' dropped an item", self.stage)
    }
}

impl StructuredLog for ItemDropped<'_> {
    fn log(&self) {
        tracing::trace!(stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("item_dropped", span_name = name, stage = self.stage)
    }
}

/// An asynchronous stage spawned its worker task.
///
/// The worker runs inside this message's span.
///
/// # Log Level
/// `debug!` - Lifecycle detail
///
/// # Example
/// ```
/// use fluid_constructs::observability::messages::pipeline::StageStarted;
/// use fluid_constructs::observability::messages::StructuredLog;
///
/// let msg = StageStarted { stage: "delay" };
///
/// assert_eq!(msg.to_string(), "Stage 'delay' started its worker");
/// let _span = msg.span("stage_worker");
/// ```
pub struct StageStarted<'a> {
    pub stage: &'a str,
}

impl Display for StageStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' started its worker", self.stage)
    }
}

impl StructuredLog for StageStarted<'_> {
    fn log(&self) {
        tracing::debug!(stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("stage_worker", span_name = name, stage = self.stage)
    }
}

/// An asynchronous stage was cancelled by its subscriber.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct StageCancelled<'a> {
    pub stage: &'a str,
}

impl Display for StageCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' cancelled", self.stage)
    }
}

impl StructuredLog for StageCancelled<'_> {
    fn log(&self) {
        tracing::debug!(stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("stage_cancelled", span_name = name, stage = self.stage)
    }
}

/// Every broadcast branch is attached and the shared upstream was subscribed.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct BroadcastConnected {
    pub branches: usize,
}

impl Display for BroadcastConnected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Broadcast connected upstream for {} branches", self.branches)
    }
}

impl StructuredLog for BroadcastConnected {
    fn log(&self) {
        tracing::debug!(branches = self.branches, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("broadcast", span_name = name, branches = self.branches)
    }
}

/// A subscriber broke the backpressure protocol.
///
/// # Log Level
/// `warn!` - The run will fail with a protocol error
///
/// # Example
/// ```
/// use fluid_constructs::observability::messages::pipeline::ProtocolViolation;
///
/// let msg = ProtocolViolation {
///     stage: "iter",
///     reason: "request(0)",
/// };
///
/// assert_eq!(msg.to_string(), "Protocol violation at stage 'iter': request(0)");
/// ```
pub struct ProtocolViolation<'a> {
    pub stage: &'a str,
    pub reason: &'a str,
}

impl Display for ProtocolViolation<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Protocol violation at stage '{}': {}", self.stage, self.reason)
    }
}

impl StructuredLog for ProtocolViolation<'_> {
    fn log(&self) {
        tracing::warn!(stage = self.stage, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "protocol_violation",
            span_name = name,
            stage = self.stage,
            reason = self.reason,
        )
    }
}
