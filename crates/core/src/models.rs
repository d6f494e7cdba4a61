//! Account and container models
//!
//! Each model has a closed set of typed fields read from well-known response
//! headers, plus one catch-all metadata map for the `*-Meta-*` headers.

use http::HeaderMap;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::metadata::{ACCOUNT_METADATA_PREFIX, CONTAINER_METADATA_PREFIX, MetadataMap};

const ACCOUNT_CONTAINER_COUNT: &str = "x-account-container-count";
const ACCOUNT_OBJECT_COUNT: &str = "x-account-object-count";
const ACCOUNT_BYTES_USED: &str = "x-account-bytes-used";
const ACCOUNT_TEMP_URL_KEY: &str = "x-account-meta-temp-url-key";

const CONTAINER_OBJECT_COUNT: &str = "x-container-object-count";
const CONTAINER_BYTES_USED: &str = "x-container-bytes-used";
const CONTAINER_READ_ACL: &str = "x-container-read";
const CONTAINER_WRITE_ACL: &str = "x-container-write";

/// An entity whose metadata can be merged or reset
///
/// Implemented by [`Account`] and [`Container`] so the service can run the
/// same flow for both.
pub trait MetadataTarget {
    /// Header prefix for this entity's metadata
    fn metadata_prefix(&self) -> &'static str;

    /// Request path, relative to the storage URL
    fn request_path(&self) -> &str;

    /// Reject entities whose request path would address something else
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Local metadata snapshot
    fn metadata(&self) -> &MetadataMap;

    /// Replace the local metadata snapshot
    fn set_metadata(&mut self, metadata: MetadataMap);

    /// Replace all typed fields and metadata from a HEAD response
    fn populate(&mut self, headers: &HeaderMap) -> Result<()>;
}

/// Storage account summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Account {
    pub container_count: u64,
    pub object_count: u64,
    pub bytes_used: u64,
    /// Key used to sign temporary URLs, when the account has one
    pub temp_url_key: Option<String>,
    pub metadata: MetadataMap,
}

impl Account {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let mut account = Self::default();
        account.populate(headers)?;
        Ok(account)
    }
}

impl MetadataTarget for Account {
    fn metadata_prefix(&self) -> &'static str {
        ACCOUNT_METADATA_PREFIX
    }

    fn request_path(&self) -> &str {
        ""
    }

    fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    fn set_metadata(&mut self, metadata: MetadataMap) {
        self.metadata = metadata;
    }

    fn populate(&mut self, headers: &HeaderMap) -> Result<()> {
        let container_count = header_u64(headers, ACCOUNT_CONTAINER_COUNT)?;
        let object_count = header_u64(headers, ACCOUNT_OBJECT_COUNT)?;
        let bytes_used = header_u64(headers, ACCOUNT_BYTES_USED)?;

        self.container_count = container_count;
        self.object_count = object_count;
        self.bytes_used = bytes_used;
        self.temp_url_key = header_str(headers, ACCOUNT_TEMP_URL_KEY);
        self.metadata = MetadataMap::from_headers(headers, ACCOUNT_METADATA_PREFIX);
        Ok(())
    }
}

/// Container summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Container {
    pub name: String,
    pub object_count: u64,
    pub bytes_used: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_acl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_acl: Option<String>,
    pub metadata: MetadataMap,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn from_headers(name: impl Into<String>, headers: &HeaderMap) -> Result<Self> {
        let mut container = Self::new(name);
        container.populate(headers)?;
        Ok(container)
    }
}

impl MetadataTarget for Container {
    fn metadata_prefix(&self) -> &'static str {
        CONTAINER_METADATA_PREFIX
    }

    fn request_path(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        validate_container_name(&self.name)
    }

    fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    fn set_metadata(&mut self, metadata: MetadataMap) {
        self.metadata = metadata;
    }

    fn populate(&mut self, headers: &HeaderMap) -> Result<()> {
        let object_count = header_u64(headers, CONTAINER_OBJECT_COUNT)?;
        let bytes_used = header_u64(headers, CONTAINER_BYTES_USED)?;

        self.object_count = object_count;
        self.bytes_used = bytes_used;
        self.read_acl = header_str(headers, CONTAINER_READ_ACL);
        self.write_acl = header_str(headers, CONTAINER_WRITE_ACL);
        self.metadata = MetadataMap::from_headers(headers, CONTAINER_METADATA_PREFIX);
        Ok(())
    }
}

/// Check that `name` addresses exactly one container
///
/// An empty name would address the account, and a `/` would address an
/// object inside the container.
pub fn validate_container_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(Error::InvalidContainerName(name.to_string()));
    }
    Ok(())
}

/// Counter header; absent means zero
fn header_u64(headers: &HeaderMap, name: &str) -> Result<u64> {
    match headers.get(name) {
        None => Ok(0),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| Error::MalformedResponse(format!("{name} is not a number: {value:?}"))),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
