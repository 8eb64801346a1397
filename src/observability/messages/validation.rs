// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration loading and validation.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A configuration file was parsed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub source_count: usize,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded configuration '{}' with {} sources",
            self.path, self.source_count
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(path = self.path, source_count = self.source_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "config_loaded",
            span_name = name,
            path = self.path,
            source_count = self.source_count,
        )
    }
}

/// A single validation problem found in a configuration.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use fluid_constructs::errors::ValidationError;
/// use fluid_constructs::observability::messages::validation::ConfigValidationIssue;
///
/// let error = ValidationError::InvalidPrefetch { prefetch: 0 };
/// let msg = ConfigValidationIssue { error: &error };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ConfigValidationIssue<'a> {
    pub error: &'a ValidationError,
}

impl Display for ConfigValidationIssue<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Configuration validation error: {}", self.error)
    }
}

impl StructuredLog for ConfigValidationIssue<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "config_validation_issue",
            name = name,
            error = %self.error,
        )
    }
}
