//! Metadata merge/reset against an in-memory object store
//!
//! `MemoryStore` applies metadata POSTs the way the service does: an empty
//! header value clears the key, anything else sets it. Responses echo the
//! resulting metadata as headers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use objstore_core::{
    ACCOUNT_METADATA_PREFIX, Account, CONTAINER_METADATA_PREFIX, Config, Container, MetadataMap,
    MetadataPlan, MetadataTarget, ObjectStoreService, Request, Response, RetryConfig,
    RetryTransport, Transport, TransportError,
};

#[derive(Default)]
struct MemoryStore {
    entities: Mutex<HashMap<String, MetadataMap>>,
}

impl MemoryStore {
    fn with_account(metadata: MetadataMap) -> Self {
        let store = Self::default();
        store.put(String::new(), metadata);
        store
    }

    fn put(&self, path: String, metadata: MetadataMap) {
        self.entities.lock().unwrap().insert(path, metadata);
    }

    fn stored(&self, path: &str) -> Option<MetadataMap> {
        self.entities.lock().unwrap().get(path).cloned()
    }
}

fn prefix_for(path: &str) -> &'static str {
    if path.is_empty() {
        ACCOUNT_METADATA_PREFIX
    } else {
        CONTAINER_METADATA_PREFIX
    }
}

fn to_headers(prefix: &str, metadata: &MetadataMap) -> HeaderMap {
    MetadataPlan::merge(metadata.clone())
        .to_headers(prefix)
        .unwrap()
}

#[async_trait]
impl Transport for MemoryStore {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let prefix = prefix_for(&request.path);
        let mut entities = self.entities.lock().unwrap();
        let Some(metadata) = entities.get_mut(&request.path) else {
            return Err(TransportError::with_status(
                StatusCode::NOT_FOUND,
                format!("{} not found", request.path),
            ));
        };

        if request.method == Method::POST {
            let lower_prefix = prefix.to_lowercase();
            for (name, value) in &request.headers {
                let Some(key) = name.as_str().strip_prefix(&lower_prefix) else {
                    continue;
                };
                let value = value.to_str().unwrap();
                if value.is_empty() {
                    metadata.remove(key);
                } else {
                    metadata.insert(key, value);
                }
            }
        } else if request.method != Method::HEAD {
            return Err(TransportError::with_status(
                StatusCode::METHOD_NOT_ALLOWED,
                "unsupported",
            ));
        }

        let mut headers = to_headers(prefix, metadata);
        if request.path.is_empty() {
            headers.insert("X-Account-Container-Count", HeaderValue::from(entities.len() - 1));
        }
        Ok(Response::new(StatusCode::NO_CONTENT).with_headers(headers))
    }
}

fn map(pairs: &[(&str, &str)]) -> MetadataMap {
    pairs.iter().copied().collect()
}

#[tokio::test]
async fn merge_overlays_existing_keys() {
    let store = Arc::new(MemoryStore::with_account(map(&[("b", "2")])));
    let service = ObjectStoreService::new(store.clone(), Config::default());

    let mut account = service.get_account().await.unwrap();
    service
        .merge_metadata(&mut account, map(&[("a", "1")]))
        .await
        .unwrap();

    let refetched = service.fetch_metadata(&account).await.unwrap();
    assert_eq!(refetched, map(&[("a", "1"), ("b", "2")]));
    assert_eq!(account.metadata, refetched);
}

#[tokio::test]
async fn reset_with_same_metadata_is_idempotent() {
    let m = map(&[("color", "blue"), ("owner", "ops")]);
    let store = Arc::new(MemoryStore::with_account(m.clone()));
    let service = ObjectStoreService::new(store.clone(), Config::default());

    let mut account = service.get_account().await.unwrap();
    service.reset_metadata(&mut account, m.clone()).await.unwrap();

    service.retrieve(&mut account).await.unwrap();
    assert_eq!(account.metadata, m);
    assert_eq!(store.stored("").unwrap(), m);
}

#[tokio::test]
async fn reset_replaces_everything() {
    let store = Arc::new(MemoryStore::with_account(map(&[("old", "x"), ("keep", "y")])));
    store.put("photos".to_string(), map(&[("stale", "1")]));
    let service = ObjectStoreService::new(store.clone(), Config::default());

    let mut account = service.get_account().await.unwrap();
    assert_eq!(account.container_count, 1);

    let confirmed = service
        .reset_metadata(&mut account, map(&[("keep", "z"), ("new", "n")]))
        .await
        .unwrap();
    assert_eq!(confirmed, &map(&[("keep", "z"), ("new", "n")]));

    let mut container = service.get_container("photos").await.unwrap();
    service
        .reset_metadata(&mut container, MetadataMap::new())
        .await
        .unwrap();
    assert!(container.metadata.is_empty());
    assert!(store.stored("photos").unwrap().is_empty());
}

#[tokio::test]
async fn reset_clears_keys_added_behind_our_back() {
    let store = Arc::new(MemoryStore::with_account(MetadataMap::new()));
    let service = ObjectStoreService::new(store.clone(), Config::default());
    let mut account = service.get_account().await.unwrap();

    // Another client writes after we loaded the account.
    store.put(String::new(), map(&[("foreign", "1")]));

    service
        .reset_metadata(&mut account, map(&[("mine", "1")]))
        .await
        .unwrap();
    assert_eq!(store.stored("").unwrap(), map(&[("mine", "1")]));
}

#[tokio::test]
async fn missing_container() {
    let store = Arc::new(MemoryStore::with_account(MetadataMap::new()));
    store.put("present".to_string(), MetadataMap::new());
    let service = ObjectStoreService::new(store, Config::default());

    assert!(service.container_exists("present").await.unwrap());
    assert!(!service.container_exists("absent").await.unwrap());

    let mut container = Container::new("absent");
    container.metadata = map(&[("kept", "yes")]);
    let err = service
        .merge_metadata(&mut container, map(&[("a", "1")]))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(container.metadata, map(&[("kept", "yes")]));
}

#[tokio::test]
async fn empty_container_name_never_reaches_account() {
    let store = Arc::new(MemoryStore::with_account(map(&[("owner", "ops")])));
    let service = ObjectStoreService::new(store.clone(), Config::default());

    let err = service.container_exists("").await.unwrap_err();
    assert!(err.is_invalid_input());

    let mut container = Container::new("");
    let err = service
        .reset_metadata(&mut container, map(&[("color", "blue")]))
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(store.stored("").unwrap(), map(&[("owner", "ops")]));
}

#[tokio::test]
async fn works_through_retry_transport() {
    let store = Arc::new(MemoryStore::with_account(map(&[("b", "2")])));
    let transport = RetryTransport::new(store.clone(), RetryConfig::default());
    let service = ObjectStoreService::new(transport, Config::default());

    let mut account = Account::default();
    service.retrieve(&mut account).await.unwrap();
    assert_eq!(account.metadata(), &map(&[("b", "2")]));
}

#[tokio::test]
async fn service_is_shareable_across_tasks() {
    let store = Arc::new(MemoryStore::with_account(MetadataMap::new()));
    for name in ["a", "b", "c"] {
        store.put(name.to_string(), MetadataMap::new());
    }

    let mut config = Config::default();
    config.temp_url.key = Some("mykey".to_string());
    let service = Arc::new(ObjectStoreService::new(store.clone(), config));

    let mut handles = Vec::new();
    for name in ["a", "b", "c"] {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let mut container = service.get_container(name).await.unwrap();
            service
                .merge_metadata(&mut container, map(&[("owner", name)]))
                .await
                .unwrap();
            let path = format!("/v1/AUTH_account/{name}/object");
            service.temp_url("GET", 1516741234, &path).unwrap()
        }));
    }

    for handle in handles {
        let signed = handle.await.unwrap();
        assert_eq!(signed.signature.len(), 40);
    }
    for name in ["a", "b", "c"] {
        assert_eq!(store.stored(name).unwrap(), map(&[("owner", name)]));
    }
}
