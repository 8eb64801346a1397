// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_PREFETCH;
use crate::errors::StreamError;
use crate::observability::messages::validation::{ConfigLoaded, ConfigValidationIssue};
use crate::observability::messages::StructuredLog;
use crate::sources::SourceRegistry;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Top-level configuration for a set of named sources.
///
/// # Fields
/// * `engine` - Engine tuning options (optional)
/// * `sources` - The sources to build, each resolved through a `SourceRegistry`
///
/// # Example
/// ```yaml
/// engine:
///   prefetch: 16
/// sources:
///   - name: numbers
///     type: inline
///     options:
///       items: [1, 2, 3]
///   - name: log
///     type: file-lines
///     options:
///       path: ./input.txt
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineOptions,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Engine tuning options.
///
/// # Fields
/// * `prefetch` - Items requested from each source up front by merge and zip
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineOptions {
    #[serde(default = "default_prefetch")]
    pub prefetch: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            prefetch: DEFAULT_PREFETCH,
        }
    }
}

fn default_prefetch() -> u64 {
    DEFAULT_PREFETCH
}

fn empty_options() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default = "empty_options")]
    pub options: Value, // factory-specific options
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, StreamError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|err| StreamError::io(path.display().to_string(), &err))?;
    let cfg: Config = serde_yaml::from_str(&content)
        .map_err(|err| StreamError::Config(format!("{}: {}", path.display(), err)))?;

    ConfigLoaded {
        path: &path.display().to_string(),
        source_count: cfg.sources.len(),
    }
    .log();
    Ok(cfg)
}

/// Load a configuration and validate it against the built-in source types.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, StreamError> {
    load_and_validate_config_with(path, &SourceRegistry::with_builtins())
}

/// Load a configuration and validate it against `registry`.
pub fn load_and_validate_config_with<P: AsRef<Path>>(
    path: P,
    registry: &SourceRegistry,
) -> Result<Config, StreamError> {
    let cfg = load_config(path)?;

    if let Err(validation_errors) = crate::config::validate_config(&cfg, registry) {
        for error in &validation_errors {
            ConfigValidationIssue { error }.log();
        }
        let error_messages: Vec<String> = validation_errors.iter().map(|e| e.to_string()).collect();
        return Err(StreamError::Config(format!(
            "Configuration validation failed:\n{}",
            error_messages.join("\n")
        )));
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
engine:
  prefetch: 4
sources:
  - name: numbers
    type: inline
    options:
      items: [1, 2, 3]
  - name: log
    type: file-lines
    options:
      path: ./input.txt
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.engine.prefetch, 4);
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].source_type, "inline");
        assert_eq!(cfg.sources[0].options, json!({ "items": [1, 2, 3] }));
        assert_eq!(cfg.sources[1].options["path"], json!("./input.txt"));
    }

    #[test]
    fn parse_defaults() {
        let yaml = r#"
sources:
  - name: empty
    type: inline
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.engine.prefetch, DEFAULT_PREFETCH);
        assert_eq!(cfg.sources[0].options, json!({}));
    }

    #[test]
    fn test_load_and_validate_valid_config() {
        let file = write_config(
            r#"
sources:
  - name: numbers
    type: inline
    options:
      items: [1, 2]
"#,
        );

        let result = load_and_validate_config(file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_and_validate_reports_every_error() {
        let file = write_config(
            r#"
engine:
  prefetch: 0
sources:
  - name: a
    type: inline
  - name: a
    type: kafka
"#,
        );

        let message = match load_and_validate_config(file.path()) {
            Err(StreamError::Config(message)) => message,
            other => panic!("expected a config error, got {:?}", other),
        };
        assert!(message.contains("prefetch"));
        assert!(message.contains("Duplicate source name: 'a'"));
        assert!(message.contains("kafka"));
    }

    #[test]
    fn test_load_config_rejects_malformed_yaml() {
        let file = write_config("sources: [name: x\n");
        assert!(matches!(load_config(file.path()), Err(StreamError::Config(_))));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/fluid.yaml");
        assert!(matches!(result, Err(StreamError::Io { .. })));
    }
}
