// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for source adapter events.
//!
//! This module contains message types for logging events related to:
//! * Registering source factories
//! * Creating named sources from configuration

use crate::errors::StreamError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A source factory was registered under a type name.
///
/// # Log Level
/// `debug!` - Setup detail
pub struct SourceRegistered<'a> {
    pub source_type: &'a str,
}

impl Display for SourceRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Registered source factory '{}'", self.source_type)
    }
}

impl StructuredLog for SourceRegistered<'_> {
    fn log(&self) {
        tracing::debug!(source_type = self.source_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "source_registered",
            span_name = name,
            source_type = self.source_type,
        )
    }
}

/// A factory started building a source; the build runs in this message's span.
///
/// # Log Level
/// `debug!` - Setup detail
///
/// # Example
/// ```
/// use fluid_constructs::observability::messages::source::SourceCreationStarted;
///
/// let msg = SourceCreationStarted {
///     name: "numbers",
///     source_type: "inline",
/// };
///
/// assert_eq!(msg.to_string(), "Creating source 'numbers' of type 'inline'");
/// ```
pub struct SourceCreationStarted<'a> {
    pub name: &'a str,
    pub source_type: &'a str,
}

impl Display for SourceCreationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Creating source '{}' of type '{}'",
            self.name, self.source_type
        )
    }
}

impl StructuredLog for SourceCreationStarted<'_> {
    fn log(&self) {
        tracing::debug!(name = self.name, source_type = self.source_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "source_creation",
            span_name = name,
            name = self.name,
            source_type = self.source_type,
        )
    }
}

/// A source was created from configuration.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use fluid_constructs::observability::messages::source::SourceCreated;
///
/// let msg = SourceCreated {
///     name: "numbers",
///     source_type: "inline",
/// };
///
/// assert_eq!(msg.to_string(), "Created source 'numbers' of type 'inline'");
/// ```
pub struct SourceCreated<'a> {
    pub name: &'a str,
    pub source_type: &'a str,
}

impl Display for SourceCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created source '{}' of type '{}'",
            self.name, self.source_type
        )
    }
}

impl StructuredLog for SourceCreated<'_> {
    fn log(&self) {
        tracing::info!(name = self.name, source_type = self.source_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "source_created",
            span_name = name,
            name = self.name,
            source_type = self.source_type,
        )
    }
}

/// A source factory failed to build a source.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct SourceCreationFailed<'a> {
    pub name: &'a str,
    pub source_type: &'a str,
    pub error: &'a StreamError,
}

impl Display for SourceCreationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to create source '{}' of type '{}': {}",
            self.name, self.source_type, self.error
        )
    }
}

impl StructuredLog for SourceCreationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            name = self.name,
            source_type = self.source_type,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "source_creation_failed",
            span_name = name,
            name = self.name,
            source_type = self.source_type,
            error = %self.error,
        )
    }
}
