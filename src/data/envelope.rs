// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Metadata attached to an envelope. Keys are unique; values are arbitrary JSON.
pub type Metadata = BTreeMap<String, Value>;

/// An immutable payload plus its metadata headers.
///
/// Every transformation produces a new envelope. The metadata map is shared
/// between an envelope and the envelopes derived from it until one of them
/// adds or overwrites a key.
///
/// # Example
/// ```
/// use fluid_constructs::data::Data;
///
/// let data = Data::new(21).with("origin", "sensor-7");
/// let doubled = data.with_payload(data.payload() * 2);
///
/// assert_eq!(*doubled.payload(), 42);
/// assert_eq!(doubled.get("origin").unwrap(), "sensor-7");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Data<T> {
    payload: T,
    metadata: Arc<Metadata>,
}

impl<T> Data<T> {
    /// Wrap a payload with empty metadata.
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            metadata: Arc::new(Metadata::new()),
        }
    }

    /// Wrap a payload with the given metadata.
    pub fn with_metadata(payload: T, metadata: Metadata) -> Self {
        Self {
            payload,
            metadata: Arc::new(metadata),
        }
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Look up a metadata value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Look up a metadata value and decode it into `V`.
    ///
    /// Returns `None` when the key is absent or the value has another shape.
    pub fn get_as<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        self.metadata
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// A new envelope with the same metadata and a replaced payload.
    pub fn with_payload<U>(&self, payload: U) -> Data<U> {
        Data {
            payload,
            metadata: Arc::clone(&self.metadata),
        }
    }

    /// Consume the envelope, mapping its payload and keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Data<U> {
        Data {
            payload: f(self.payload),
            metadata: self.metadata,
        }
    }

    /// Consume the envelope, adding or overwriting one metadata entry.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.metadata).insert(key.into(), value.into());
        self
    }

    pub(crate) fn shared_metadata(&self) -> &Arc<Metadata> {
        &self.metadata
    }

    pub(crate) fn from_shared(payload: T, metadata: Arc<Metadata>) -> Self {
        Self { payload, metadata }
    }
}

impl<T: Clone> Data<T> {
    /// A new envelope with one metadata entry added or overwritten.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clone().insert(key, value)
    }
}

impl<T> From<T> for Data<T> {
    fn from(payload: T) -> Self {
        Data::new(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_payload_preserves_metadata() {
        let original = Data::new(1).with("trace", "abc").with("attempt", 2);
        let replaced = original.with_payload("one");

        assert_eq!(*replaced.payload(), "one");
        assert_eq!(replaced.get("trace"), Some(&json!("abc")));
        assert_eq!(replaced.get_as::<u32>("attempt"), Some(2));
    }

    #[test]
    fn with_never_mutates_the_source_envelope() {
        let original = Data::new("x").with("k", 1);
        let updated = original.with("k", 2).with("other", true);

        assert_eq!(original.get("k"), Some(&json!(1)));
        assert!(original.get("other").is_none());
        assert_eq!(updated.get("k"), Some(&json!(2)));
        assert_eq!(updated.metadata().len(), 2);
    }

    #[test]
    fn get_as_rejects_mismatched_shapes() {
        let data = Data::new(()).with("count", "not-a-number");
        assert_eq!(data.get_as::<u64>("count"), None);
        assert_eq!(data.get_as::<String>("count"), Some("not-a-number".to_string()));
        assert!(data.get("absent").is_none());
    }

    #[test]
    fn map_keeps_shared_metadata() {
        let data = Data::new(2).with("unit", "ms");
        let mapped = data.clone().map(|v| v * 10);
        assert_eq!(*mapped.payload(), 20);
        assert!(Arc::ptr_eq(data.shared_metadata(), mapped.shared_metadata()));
    }
}
