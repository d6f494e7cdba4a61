//! objstore-core: Core library for Swift-style object storage clients
//!
//! This crate provides:
//! - Temporary URL signing (HMAC over method, expiry and path)
//! - Metadata maps and reset/merge planning for accounts and containers
//! - Typed account and container models populated from response headers
//! - A service facade over a pluggable `Transport`
//! - Configuration management
//!
//! The HTTP client is not part of this crate. Anything implementing
//! [`Transport`] can back [`ObjectStoreService`].

pub mod config;
pub mod error;
pub mod metadata;
pub mod models;
pub mod retry;
pub mod service;
pub mod tempurl;
pub mod transport;

pub use config::{Config, ConfigManager, RetryConfig, TempUrlConfig, validate_api_version};
pub use error::{Error, Result};
pub use metadata::{
    ACCOUNT_METADATA_PREFIX, CONTAINER_METADATA_PREFIX, MetadataMap, MetadataPlan, reconcile,
};
pub use models::{Account, Container, MetadataTarget, validate_container_name};
pub use retry::{RetryTransport, is_retryable_error, retry_with_backoff};
pub use service::ObjectStoreService;
pub use tempurl::{
    SignedUrl, TempUrlDigest, TempUrlMethod, TempUrlSigner, canonical_string, compute_signed_path,
};
pub use transport::{Request, Response, Transport, TransportError};
