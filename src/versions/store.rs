//! Version store: records a request's history without duplicates.

use std::sync::Arc;

use crate::codec::Codec;
use crate::db::VersionRepository;
use crate::errors::AppError;
use crate::models::{
    NewRequestVersion, Request, RequestVersion, Snapshot, REQUEST_TYPE, REQUEST_VERSION_TYPE,
};

use super::differ::has_changed;
use super::lock::KeyedLocks;

/// Creates and looks up [`RequestVersion`]s.
///
/// `create` is serialized per request id, so concurrent saves of one request
/// cannot both append the same content.
#[derive(Clone)]
pub struct VersionStore {
    repository: Arc<dyn VersionRepository>,
    codec: Arc<dyn Codec>,
    locks: KeyedLocks,
}

impl VersionStore {
    pub fn new(repository: Arc<dyn VersionRepository>, codec: Arc<dyn Codec>) -> Self {
        Self {
            repository,
            codec,
            locks: KeyedLocks::new(),
        }
    }

    /// Record `request` as a new version, or return the latest version if
    /// nothing relevant changed since it was taken.
    pub async fn create(&self, request: &Request) -> Result<RequestVersion, AppError> {
        if !request.is_request_kind() {
            return Err(AppError::InvalidArgument(format!(
                "New {} was not given a valid {} instance (got type {:?})",
                REQUEST_VERSION_TYPE, REQUEST_TYPE, request.kind
            )));
        }

        let parent_id = request.id.as_str();
        let _guard = self.locks.lock(parent_id).await;

        let latest = self.repository.most_recent_by_parent(parent_id).await?;
        let old_snapshot = match &latest {
            Some(version) => Some(self.snapshot(version)?),
            None => None,
        };

        match latest {
            Some(latest) if !has_changed(old_snapshot.as_ref(), request) => {
                tracing::debug!(
                    "Request {} unchanged since version {}, reusing it",
                    parent_id,
                    latest.id
                );
                Ok(latest)
            }
            _ => {
                let fields = Snapshot::capture(request)?;
                let compressed_request = self.codec.compress(&fields.to_value())?;
                let version = self
                    .repository
                    .insert(NewRequestVersion {
                        parent_id: parent_id.to_string(),
                        compressed_request,
                    })
                    .await?;

                tracing::info!("Created version {} of request {}", version.id, parent_id);
                Ok(version)
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<RequestVersion>, AppError> {
        self.repository.get(id).await
    }

    pub async fn get_latest_by_parent_id(
        &self,
        parent_id: &str,
    ) -> Result<Option<RequestVersion>, AppError> {
        self.repository.most_recent_by_parent(parent_id).await
    }

    pub async fn all(&self) -> Result<Vec<RequestVersion>, AppError> {
        self.repository.all().await
    }

    /// Decode the request fields stored in `version`.
    pub fn snapshot(&self, version: &RequestVersion) -> Result<Snapshot, AppError> {
        Snapshot::from_value(self.codec.decompress(&version.compressed_request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ZstdCodec;
    use crate::db::MemoryVersionRepository;
    use crate::models::NewRequest;

    fn store() -> (VersionStore, Arc<MemoryVersionRepository>) {
        let repository = Arc::new(MemoryVersionRepository::new());
        let store = VersionStore::new(repository.clone(), Arc::new(ZstdCodec::default()));
        (store, repository)
    }

    fn request() -> Request {
        Request::from_new(NewRequest {
            name: Some("A".to_string()),
            url: Some("http://x".to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_first_create_persists_snapshot() {
        let (store, repository) = store();
        let r = request();

        let version = store.create(&r).await.unwrap();

        assert_eq!(version.parent_id, r.id);
        assert_eq!(version.kind, REQUEST_VERSION_TYPE);
        assert_eq!(repository.count_by_parent(&r.id).await, 1);

        let snapshot = store.snapshot(&version).unwrap();
        assert_eq!(snapshot.id(), Some(r.id.as_str()));
        assert_eq!(snapshot, Snapshot::capture(&r).unwrap());
    }

    #[tokio::test]
    async fn test_unchanged_request_reuses_latest() {
        let (store, repository) = store();
        let r = request();

        let first = store.create(&r).await.unwrap();
        let second = store.create(&r).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repository.count_by_parent(&r.id).await, 1);
    }

    #[tokio::test]
    async fn test_changed_request_creates_new_version() {
        let (store, repository) = store();
        let mut r = request();

        let first = store.create(&r).await.unwrap();
        r.method = "POST".to_string();
        let second = store.create(&r).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repository.count_by_parent(&r.id).await, 2);
        assert_eq!(
            store.get_latest_by_parent_id(&r.id).await.unwrap(),
            Some(second)
        );
    }

    #[tokio::test]
    async fn test_excluded_field_change_reuses_latest() {
        let (store, repository) = store();
        let mut r = request();

        let first = store.create(&r).await.unwrap();
        r.name = "Renamed".to_string();
        r.description = "Now with docs".to_string();
        let second = store.create(&r).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repository.count_by_parent(&r.id).await, 1);
    }

    #[tokio::test]
    async fn test_rejects_non_request_kind() {
        let (store, repository) = store();
        let mut r = request();
        r.kind = "Workspace".to_string();

        let err = store.create(&r).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(repository.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_latest_payload_propagates() {
        let (store, repository) = store();
        let r = request();
        repository
            .insert(NewRequestVersion {
                parent_id: r.id.clone(),
                compressed_request: "not a payload".to_string(),
            })
            .await
            .unwrap();

        let err = store.create(&r).await.unwrap_err();
        assert!(matches!(err, AppError::Codec(_)));
    }

    #[tokio::test]
    async fn test_versions_are_tracked_per_parent() {
        let (store, _repository) = store();
        let a = request();
        let b = request();

        let va = store.create(&a).await.unwrap();
        let vb = store.create(&b).await.unwrap();

        assert_ne!(va.id, vb.id);
        assert_eq!(store.get_latest_by_parent_id(&a.id).await.unwrap(), Some(va.clone()));
        assert_eq!(store.get_by_id(&vb.id).await.unwrap(), Some(vb));
        assert_eq!(store.all().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_do_not_duplicate() {
        let (store, repository) = store();
        let r = request();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let r = r.clone();
            handles.push(tokio::spawn(async move { store.create(&r).await }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(repository.count_by_parent(&r.id).await, 1);
    }
}
