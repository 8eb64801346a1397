// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::Instrument;

use crate::engine::DataStream;
use crate::errors::StreamError;
use crate::observability::messages::source::{
    SourceCreated, SourceCreationFailed, SourceCreationStarted, SourceRegistered,
};
use crate::observability::messages::StructuredLog;
use crate::traits::SourceFactory;

use super::{FileLinesSourceFactory, InlineSourceFactory};

/// Resolves source factories by type name.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    factories: HashMap<String, Arc<dyn SourceFactory>>,
}

impl SourceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `inline` and `file-lines` factories.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(InlineSourceFactory);
        registry.register(FileLinesSourceFactory);
        registry
    }

    /// Register a factory under its own name, replacing any previous one.
    pub fn register(&mut self, factory: impl SourceFactory + 'static) {
        let name = factory.name().to_string();
        SourceRegistered { source_type: &name }.log();
        self.factories.insert(name, Arc::new(factory));
    }

    pub fn contains(&self, source_type: &str) -> bool {
        self.factories.contains_key(source_type)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a source with the factory registered under `source_type`.
    pub async fn create(
        &self,
        source_type: &str,
        config: &Value,
    ) -> Result<DataStream<Value>, StreamError> {
        let factory = self
            .factories
            .get(source_type)
            .ok_or_else(|| StreamError::SourceNotFound(source_type.to_string()))?;

        let requested_name = config
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(source_type);
        let started = SourceCreationStarted {
            name: requested_name,
            source_type,
        };
        started.log();

        let created = factory
            .create(config)
            .instrument(started.span("source_creation"))
            .await;
        match created {
            Ok(stream) => {
                SourceCreated {
                    name: stream.name().unwrap_or(requested_name),
                    source_type,
                }
                .log();
                Ok(stream)
            }
            Err(error) => {
                SourceCreationFailed {
                    name: requested_name,
                    source_type,
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct CountingFactory;

    #[async_trait]
    impl SourceFactory for CountingFactory {
        fn name(&self) -> &str {
            "counting"
        }

        async fn create(&self, config: &Value) -> Result<DataStream<Value>, StreamError> {
            let upto = config.get("upto").and_then(Value::as_u64).unwrap_or(3);
            Ok(DataStream::from_payloads((1..=upto).map(Value::from).collect::<Vec<_>>()))
        }
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = SourceRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["file-lines", "inline"]);
        assert!(registry.contains("inline"));
        assert!(!registry.contains("kafka"));
    }

    #[tokio::test]
    async fn test_unknown_source_type() {
        let registry = SourceRegistry::with_builtins();
        let result = registry.create("kafka", &json!({})).await;
        assert!(matches!(result, Err(StreamError::SourceNotFound(name)) if name == "kafka"));
    }

    #[tokio::test]
    async fn test_custom_factory() {
        let mut registry = SourceRegistry::new();
        registry.register(CountingFactory);

        let stream = registry.create("counting", &json!({ "upto": 4 })).await.unwrap();
        let items = stream.flow().collect().await.unwrap();

        let payloads: Vec<Value> = items.into_iter().map(|data| data.into_payload()).collect();
        assert_eq!(payloads, vec![json!(1), json!(2), json!(3), json!(4)]);
    }
}
