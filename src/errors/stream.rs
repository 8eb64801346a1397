// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The single failure type carried through publishers, subscribers and
//! completion signals.

use thiserror::Error;

/// Errors raised while a pipeline runs.
///
/// `StreamError` is `Clone` because a single failure is fanned out to every
/// downstream branch of a broadcast and may be read from a completion signal
/// any number of times.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// A transformation step failed while processing an item.
    #[error("transformation failed: {0}")]
    Transform(String),

    /// The upstream producer failed.
    #[error("source failed: {0}")]
    Source(String),

    /// A sink rejected an item.
    #[error("sink failed: {0}")]
    Sink(String),

    /// A subscriber requested a non-positive amount of items.
    #[error("invalid demand: request({0}) must be positive")]
    InvalidDemand(u64),

    /// A unicast publisher (such as a broadcast branch) was subscribed twice.
    #[error("publisher '{0}' accepts a single subscriber")]
    AlreadySubscribed(String),

    /// An asynchronous stage or sink was used outside of a tokio runtime.
    #[error("no tokio runtime available for asynchronous stage '{0}'")]
    NoRuntime(String),

    /// An I/O operation behind a source or sink failed.
    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },

    /// No source factory is registered under the requested name.
    #[error("no source factory registered under '{0}'")]
    SourceNotFound(String),

    /// A source factory could not build its source.
    #[error("failed to create source '{name}': {reason}")]
    SourceCreation { name: String, reason: String },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// An engine invariant was broken.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StreamError {
    /// Wraps a user-supplied closure failure as a transform failure, keeping
    /// the whole context chain in the message.
    pub fn transform(err: anyhow::Error) -> Self {
        StreamError::Transform(format!("{:#}", err))
    }

    /// Wraps a user-supplied closure failure as a sink failure.
    pub fn sink(err: anyhow::Error) -> Self {
        StreamError::Sink(format!("{:#}", err))
    }

    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        StreamError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn transform_keeps_context_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("division by zero"))
            .context("computing ratio")
            .unwrap_err();
        let wrapped = StreamError::transform(err);
        assert_eq!(
            wrapped.to_string(),
            "transformation failed: computing ratio: division by zero"
        );
    }

    #[test]
    fn io_error_names_the_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = StreamError::io("/tmp/out.txt", &io);
        assert!(err.to_string().contains("/tmp/out.txt"));
        assert!(err.to_string().contains("missing"));
    }
}
