//! Metadata maps and reset/merge planning
//!
//! Account and container metadata travel as prefixed headers
//! (`X-Account-Meta-Color: blue`). Keys here are stored without the prefix
//! and compared case-insensitively, since the service is free to change
//! header casing.

use std::collections::{BTreeMap, BTreeSet};

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Header prefix for account metadata
pub const ACCOUNT_METADATA_PREFIX: &str = "X-Account-Meta-";

/// Header prefix for container metadata
pub const CONTAINER_METADATA_PREFIX: &str = "X-Container-Meta-";

/// Case-insensitive metadata mapping
///
/// The first spelling seen for a key is kept for output.
#[derive(Debug, Clone, Default)]
pub struct MetadataMap {
    entries: BTreeMap<String, (String, String)>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, returning the previous value if there was one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&key.to_lowercase()) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.insert(key.to_lowercase(), (key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_lowercase())
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&key.to_lowercase()).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in their stored spelling
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Collect metadata from response headers
    ///
    /// Each header name is tested against `prefix` on its own; matching
    /// headers contribute their name with the prefix stripped. Values that
    /// are not valid UTF-8 are skipped.
    pub fn from_headers(headers: &HeaderMap, prefix: &str) -> Self {
        let prefix = prefix.to_lowercase();
        let mut map = Self::new();

        for (name, value) in headers {
            let Some(key) = name.as_str().strip_prefix(&prefix) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            match value.to_str() {
                Ok(v) => {
                    map.insert(key, v);
                }
                Err(_) => {
                    tracing::warn!(header = name.as_str(), "Skipping non-UTF-8 metadata header");
                }
            }
        }

        map
    }

    /// Read a decoded `metadata` object
    ///
    /// String, number and boolean values are accepted; anything else means
    /// the response is not shaped the way the service documents it.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            Error::MalformedResponse("metadata is not a JSON object".to_string())
        })?;

        let mut map = Self::new();
        for (key, value) in object {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(Error::MalformedResponse(format!(
                        "metadata value for '{key}' is not a scalar: {other}"
                    )));
                }
            };
            map.insert(key.as_str(), value);
        }
        Ok(map)
    }
}

impl PartialEq for MetadataMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, (_, va)), (kb, (_, vb)))| ka == kb && va == vb)
    }
}

impl Eq for MetadataMap {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for MetadataMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Operations that converge remote metadata to a desired state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataPlan {
    /// Keys to clear
    pub to_remove: BTreeSet<String>,
    /// Keys to write
    pub to_set: MetadataMap,
}

impl MetadataPlan {
    /// Additive plan: write `desired`, remove nothing
    pub fn merge(desired: MetadataMap) -> Self {
        Self {
            to_remove: BTreeSet::new(),
            to_set: desired,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_set.is_empty()
    }

    /// Header list for this plan, sorted by header name
    ///
    /// Removals carry an empty value. A key that is removed and set again is
    /// listed once, with its new value.
    pub fn header_list(&self, prefix: &str) -> Vec<(String, String)> {
        let mut headers: BTreeMap<String, (String, String)> = BTreeMap::new();

        for key in &self.to_remove {
            if !self.to_set.contains_key(key) {
                headers.insert(
                    key.to_lowercase(),
                    (format!("{prefix}{key}"), String::new()),
                );
            }
        }
        for (key, value) in self.to_set.iter() {
            headers.insert(
                key.to_lowercase(),
                (format!("{prefix}{key}"), value.to_string()),
            );
        }

        headers.into_values().collect()
    }

    /// Build request headers for this plan
    pub fn to_headers(&self, prefix: &str) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in self.header_list(prefix) {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidMetadata(format!("invalid metadata key: {name}")))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| Error::InvalidMetadata(format!("invalid value for {name}")))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

/// Plan a reset: clear everything currently set, then write `desired`
///
/// Every key of `current` is removed, including keys that `desired` sets
/// again; the service applies removals and additions independently, so this
/// converges regardless of what the remote side held.
pub fn reconcile(desired: MetadataMap, current: &MetadataMap) -> MetadataPlan {
    MetadataPlan {
        to_remove: current.keys().map(str::to_string).collect(),
        to_set: desired,
    }
}
