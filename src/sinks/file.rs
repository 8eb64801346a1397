// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::data::Data;
use crate::engine::CompletionSignal;
use crate::errors::StreamError;
use crate::traits::Sink;

/// Appends each payload, followed by a newline, to a file.
///
/// The file is created on the first write. Each dispatch resolves once the
/// line was written and flushed. Requires a tokio runtime.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: Arc<PathBuf>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn append_line(path: &Path, line: String) -> Result<(), StreamError> {
    let io_error = |err: std::io::Error| StreamError::io(path.display().to_string(), &err);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(io_error)?;
    file.write_all(line.as_bytes()).await.map_err(io_error)?;
    file.flush().await.map_err(io_error)?;
    Ok(())
}

impl<T: Display> Sink<T> for FileSink {
    fn dispatch(&self, data: Data<T>) -> CompletionSignal {
        let line = format!("{}\n", data.payload());
        let path = Arc::clone(&self.path);
        CompletionSignal::spawn("file", async move { append_line(&path, line).await })
    }

    fn name(&self) -> Option<&str> {
        Some("file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = FileSink::new(&path);

        for n in [1, 2, 6] {
            sink.dispatch(Data::new(n)).await.unwrap();
        }

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "1\n2\n6\n");
    }

    #[tokio::test]
    async fn test_file_sink_reports_io_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        let sink = FileSink::new(&path);

        let outcome = sink.dispatch(Data::new("line")).await;
        assert!(matches!(outcome, Err(StreamError::Io { .. })));
    }
}
