// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::engine::DataStream;
use crate::errors::StreamError;
use crate::traits::SourceFactory;

pub const INLINE_SOURCE_TYPE: &str = "inline";

#[derive(Debug, Deserialize)]
struct InlineOptions {
    items: Vec<Value>,
    #[serde(default)]
    name: Option<String>,
}

/// Emits the JSON values listed under `items`.
///
/// ```yaml
/// type: inline
/// options:
///   name: numbers
///   items: [1, 2, 3]
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSourceFactory;

#[async_trait]
impl SourceFactory for InlineSourceFactory {
    fn name(&self) -> &str {
        INLINE_SOURCE_TYPE
    }

    async fn create(&self, config: &Value) -> Result<DataStream<Value>, StreamError> {
        let options = InlineOptions::deserialize(config).map_err(|err| {
            StreamError::SourceCreation {
                name: INLINE_SOURCE_TYPE.to_string(),
                reason: err.to_string(),
            }
        })?;

        let stream = DataStream::from_payloads(options.items);
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

    #[tokio::test]
    async fn test_inline_emits_items_and_takes_name() {
        let config = json!({ "name": "numbers", "items": [1, "two", 3.5] });
        let stream = InlineSourceFactory.create(&config).await.unwrap();

        assert_eq!(stream.name(), Some("numbers"));
        let payloads: Vec<Value> = stream
            .flow()
            .collect()
            .await
            .unwrap()
            .into_iter()
            .map(|data| data.into_payload())
            .collect();
        assert_eq!(payloads, vec![json!(1), json!("two"), json!(3.5)]);
    }

    #[tokio::test]
    async fn test_inline_requires_items() {
        let result = InlineSourceFactory.create(&json!({ "name": "x" })).await;
        assert!(matches!(result, Err(StreamError::SourceCreation { .. })));
    }
}
