// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use crate::config::Config;
use crate::engine::DataStream;
use crate::errors::StreamError;
use crate::sources::SourceRegistry;

pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Create every configured source through `registry`, in declaration order.
    ///
    /// Each stream is named after its configuration entry and carries the
    /// configured prefetch. The first factory failure aborts the build.
    pub async fn from_config(
        cfg: &Config,
        registry: &SourceRegistry,
    ) -> Result<Vec<(String, DataStream<Value>)>, StreamError> {
        let mut sources = Vec::with_capacity(cfg.sources.len());
        for source in &cfg.sources {
            let stream = registry
                .create(&source.source_type, &source.options)
                .await?
                .named(source.name.as_str())
                .with_prefetch(cfg.engine.prefetch);
            sources.push((source.name.clone(), stream));
        }
        Ok(sources)
    }
}
