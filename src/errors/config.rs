// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two sources share the same name
    DuplicateSourceName {
        /// The duplicated name
        name: String,
    },
    /// A source references a factory type that isn't registered
    UnknownSourceType {
        /// The source declaring the type
        name: String,
        /// The unregistered type
        source_type: String,
        /// Types the registry knows about
        available: Vec<String>,
    },
    /// The engine prefetch must allow at least one item in flight
    InvalidPrefetch {
        /// The configured value
        prefetch: u64,
    },
    /// A source has an empty name
    EmptySourceName {
        /// Position of the source in the configuration
        index: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateSourceName { name } => {
                write!(f, "Duplicate source name: '{}'", name)
            }
            ValidationError::UnknownSourceType {
                name,
                source_type,
                available,
            } => {
                write!(
                    f,
                    "Source '{}' uses type '{}' which is not registered (available: {})",
                    name,
                    source_type,
                    available.join(", ")
                )
            }
            ValidationError::InvalidPrefetch { prefetch } => {
                write!(f, "Engine prefetch must be at least 1, got {}", prefetch)
            }
            ValidationError::EmptySourceName { index } => {
                write!(f, "Source at position {} has an empty name", index)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
