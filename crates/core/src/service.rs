//! Object storage service facade
//!
//! Binds a [`Transport`] and a [`Config`] to the account and container
//! operations: retrieval, existence checks, metadata merge/reset and
//! temporary URL signing.

use http::{Method, StatusCode};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{MetadataMap, MetadataPlan, reconcile};
use crate::models::{Account, Container, MetadataTarget, validate_container_name};
use crate::tempurl::{SignedUrl, TempUrlSigner};
use crate::transport::{Request, Response, Transport, TransportError};

/// Service handle for one storage account
///
/// Holds no per-entity state; entities own their metadata snapshots and are
/// passed in by `&mut` when an operation refreshes them.
pub struct ObjectStoreService<T> {
    transport: T,
    config: Config,
    signer: TempUrlSigner,
}

impl<T: Transport> ObjectStoreService<T> {
    pub fn new(transport: T, config: Config) -> Self {
        let signer = TempUrlSigner::from_config(&config);
        Self {
            transport,
            config,
            signer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// HEAD the account
    #[tracing::instrument(skip(self))]
    pub async fn get_account(&self) -> Result<Account> {
        let response = self.send(Request::new(Method::HEAD, "")).await?;
        Account::from_headers(&response.headers)
    }

    /// HEAD a container
    #[tracing::instrument(skip(self))]
    pub async fn get_container(&self, name: &str) -> Result<Container> {
        validate_container_name(name)?;
        let response = self.send(Request::new(Method::HEAD, name)).await?;
        Container::from_headers(name, &response.headers)
    }

    /// Whether a container exists; 404 is `false`, other failures are errors
    #[tracing::instrument(skip(self))]
    pub async fn container_exists(&self, name: &str) -> Result<bool> {
        validate_container_name(name)?;
        match self.send(Request::new(Method::HEAD, name)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Re-read an entity's typed fields and metadata
    pub async fn retrieve<E: MetadataTarget>(&self, entity: &mut E) -> Result<()> {
        entity.validate()?;
        let request = Request::new(Method::HEAD, entity.request_path());
        let response = self.send(request).await?;
        entity.populate(&response.headers)
    }

    /// Server-side metadata for an entity, without touching its snapshot
    pub async fn fetch_metadata<E: MetadataTarget>(&self, entity: &E) -> Result<MetadataMap> {
        entity.validate()?;
        let request = Request::new(Method::HEAD, entity.request_path());
        let response = self.send(request).await?;
        response_metadata(&response, entity.metadata_prefix())
    }

    /// Overlay `desired` onto the remote metadata; nothing is removed
    pub async fn merge_metadata<'e, E: MetadataTarget>(
        &self,
        entity: &'e mut E,
        desired: MetadataMap,
    ) -> Result<&'e MetadataMap> {
        tracing::debug!(
            path = entity.request_path(),
            keys = desired.len(),
            "Merging metadata"
        );
        self.submit(entity, MetadataPlan::merge(desired)).await
    }

    /// Replace the remote metadata with exactly `desired`
    ///
    /// Reads the current remote metadata first, so keys added by other
    /// clients since the entity was loaded are cleared too.
    pub async fn reset_metadata<'e, E: MetadataTarget>(
        &self,
        entity: &'e mut E,
        desired: MetadataMap,
    ) -> Result<&'e MetadataMap> {
        let current = self.fetch_metadata(&*entity).await?;
        let plan = reconcile(desired, &current);
        tracing::debug!(
            path = entity.request_path(),
            remove = plan.to_remove.len(),
            set = plan.to_set.len(),
            "Resetting metadata"
        );
        self.submit(entity, plan).await
    }

    /// Sign a temporary URL with the configured account key
    pub fn temp_url(&self, method: &str, expiry: u64, path: &str) -> Result<SignedUrl> {
        let key = self
            .config
            .temp_url
            .key
            .as_deref()
            .ok_or_else(|| Error::Config("temp_url.key is not set".into()))?;
        self.signer.sign(method, expiry, path, key)
    }

    /// Sign a temporary URL with an explicit key
    pub fn temp_url_with_key(
        &self,
        method: &str,
        expiry: u64,
        path: &str,
        key: &str,
    ) -> Result<SignedUrl> {
        self.signer.sign(method, expiry, path, key)
    }

    /// POST a plan and refresh the snapshot from the response
    ///
    /// The entity is only written after every fallible step succeeded.
    async fn submit<'e, E: MetadataTarget>(
        &self,
        entity: &'e mut E,
        plan: MetadataPlan,
    ) -> Result<&'e MetadataMap> {
        entity.validate()?;
        let prefix = entity.metadata_prefix();
        let headers = plan.to_headers(prefix)?;
        let request = Request::new(Method::POST, entity.request_path()).with_headers(headers);

        let response = self.send(request).await?;
        let confirmed = response_metadata(&response, prefix)?;

        entity.set_metadata(confirmed);
        Ok(entity.metadata())
    }

    async fn send(&self, request: Request) -> Result<Response> {
        tracing::debug!(method = %request.method, path = %request.path, "Sending request");
        let response = self.transport.execute(request).await?;
        if !response.status.is_success() {
            return Err(unexpected_status(response.status).into());
        }
        Ok(response)
    }
}

fn unexpected_status(status: StatusCode) -> TransportError {
    TransportError::with_status(status, "unexpected response status")
}

/// Metadata confirmed by a response
///
/// A decoded body must carry a `metadata` object; without a body the
/// prefixed headers are used.
fn response_metadata(response: &Response, prefix: &str) -> Result<MetadataMap> {
    match &response.body {
        Some(body) => {
            let metadata = body.get("metadata").ok_or_else(|| {
                Error::MalformedResponse("response body has no 'metadata' field".into())
            })?;
            MetadataMap::from_json(metadata)
        }
        None => Ok(MetadataMap::from_headers(&response.headers, prefix)),
    }
}
