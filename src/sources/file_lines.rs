// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::data::Data;
use crate::engine::DataStream;
use crate::errors::StreamError;
use crate::traits::SourceFactory;

pub const FILE_LINES_SOURCE_TYPE: &str = "file-lines";

#[derive(Debug, Deserialize)]
struct FileLinesOptions {
    path: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    skip_empty: bool,
}

/// Emits one string envelope per line of a text file.
///
/// The file is read when the source is created. Each envelope carries the
/// `path` and 1-based `line` number as metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLinesSourceFactory;

#[async_trait]
impl SourceFactory for FileLinesSourceFactory {
    fn name(&self) -> &str {
        FILE_LINES_SOURCE_TYPE
    }

    async fn create(&self, config: &Value) -> Result<DataStream<Value>, StreamError> {
        let options = FileLinesOptions::deserialize(config).map_err(|err| {
            StreamError::SourceCreation {
                name: FILE_LINES_SOURCE_TYPE.to_string(),
                reason: err.to_string(),
            }
        })?;

        let contents = tokio::fs::read_to_string(&options.path)
            .await
            .map_err(|err| StreamError::io(options.path.as_str(), &err))?;

        let items: Vec<Data<Value>> = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !(options.skip_empty && line.trim().is_empty()))
            .map(|(index, line)| {
                Data::new(Value::String(line.to_string()))
                    .insert("path", options.path.as_str())
                    .insert("line", index + 1)
            })
            .collect();

        let stream = DataStream::from_data(items);
        Ok(match options.name {
            Some(name) => stream.named(name),
            None => stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_file_lines_emits_each_line() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "alpha\n\nbeta\n").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let stream = FileLinesSourceFactory
            .create(&json!({ "path": path, "skip_empty": true }))
            .await
            .unwrap();
        let items = stream.flow().collect().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].payload(), &json!("alpha"));
        assert_eq!(items[1].get_as::<usize>("line"), Some(3));
    }

    #[tokio::test]
    async fn test_file_lines_missing_file() {
        let result = FileLinesSourceFactory
            .create(&json!({ "path": "/nonexistent/fluid/input.txt" }))
            .await;
        assert!(matches!(result, Err(StreamError::Io { .. })));
    }
}
