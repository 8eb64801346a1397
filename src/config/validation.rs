// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use crate::config::consts::MIN_PREFETCH;
use crate::config::Config;
use crate::errors::ValidationError;
use crate::sources::SourceRegistry;

/// Validates a configuration against the source types known to `registry`.
///
/// Every problem is collected, so a single run reports all of them:
/// - prefetch below the minimum
/// - empty or duplicated source names
/// - source types with no registered factory
///
/// # Example
///
/// ```rust
/// use fluid_constructs::config::{validate_config, Config};
/// use fluid_constructs::sources::SourceRegistry;
///
/// let cfg: Config = serde_yaml::from_str("sources: [{ name: n, type: inline }]").unwrap();
/// assert!(validate_config(&cfg, &SourceRegistry::with_builtins()).is_ok());
/// ```
pub fn validate_config(
    config: &Config,
    registry: &SourceRegistry,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.engine.prefetch < MIN_PREFETCH {
        errors.push(ValidationError::InvalidPrefetch {
            prefetch: config.engine.prefetch,
        });
    }

    errors.extend(validate_source_names(config));
    errors.extend(validate_source_types(config, registry));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_source_names(config: &Config) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for (index, source) in config.sources.iter().enumerate() {
        if source.name.trim().is_empty() {
            errors.push(ValidationError::EmptySourceName { index });
        } else if !seen.insert(source.name.as_str()) {
            errors.push(ValidationError::DuplicateSourceName {
                name: source.name.clone(),
            });
        }
    }

    errors
}

fn validate_source_types(config: &Config, registry: &SourceRegistry) -> Vec<ValidationError> {
    config
        .sources
        .iter()
        .filter(|source| !registry.contains(&source.source_type))
        .map(|source| ValidationError::UnknownSourceType {
            name: source.name.clone(),
            source_type: source.source_type.clone(),
            available: registry.names(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineOptions, SourceConfig};
    use serde_json::json;

    fn source(name: &str, source_type: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            source_type: source_type.to_string(),
            options: json!({}),
        }
    }

    fn config(sources: Vec<SourceConfig>) -> Config {
        Config {
            engine: EngineOptions::default(),
            sources,
        }
    }

    #[test]
    fn test_valid_config() {
        let cfg = config(vec![source("a", "inline"), source("b", "file-lines")]);
        assert!(validate_config(&cfg, &SourceRegistry::with_builtins()).is_ok());
    }

    #[test]
    fn test_valid_empty_config() {
        let cfg = config(vec![]);
        assert!(validate_config(&cfg, &SourceRegistry::new()).is_ok());
    }

    #[test]
    fn test_duplicate_source_names() {
        let cfg = config(vec![source("a", "inline"), source("a", "inline")]);
        let errors = validate_config(&cfg, &SourceRegistry::with_builtins()).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateSourceName {
                name: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_source_type_lists_available() {
        let cfg = config(vec![source("a", "kafka")]);
        let errors = validate_config(&cfg, &SourceRegistry::with_builtins()).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnknownSourceType {
                name: "a".to_string(),
                source_type: "kafka".to_string(),
                available: vec!["file-lines".to_string(), "inline".to_string()],
            }]
        );
    }

    #[test]
    fn test_multiple_errors() {
        let mut cfg = config(vec![source("", "inline"), source("x", "nope")]);
        cfg.engine.prefetch = 0;

        let errors = validate_config(&cfg, &SourceRegistry::with_builtins()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::InvalidPrefetch { prefetch: 0 }));
        assert!(errors.contains(&ValidationError::EmptySourceName { index: 0 }));
    }
}
