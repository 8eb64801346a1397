use async_trait::async_trait;
use serde_json::Value;

use crate::engine::DataStream;
use crate::errors::StreamError;

/// Builds named sources from a structured configuration.
///
/// Factories register with a `SourceRegistry` under `name()`; the registry
/// hands them the `options` object of a configured source.
#[async_trait]
pub trait SourceFactory: Send + Sync {
    fn name(&self) -> &str;

    async fn create(&self, config: &Value) -> Result<DataStream<Value>, StreamError>;
}
