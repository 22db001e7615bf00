//! In-memory stores with the same contracts as the SQLite ones.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repository::{new_record, VersionRepository};
use super::requests::{merge, RequestStore};
use crate::errors::AppError;
use crate::models::{NewRequest, NewRequestVersion, Request, RequestPatch, RequestVersion};

/// Version repository kept in a vector, in insertion order.
#[derive(Default)]
pub struct MemoryVersionRepository {
    records: RwLock<Vec<RequestVersion>>,
}

impl MemoryVersionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored versions of `parent_id`.
    pub async fn count_by_parent(&self, parent_id: &str) -> usize {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.parent_id == parent_id)
            .count()
    }
}

#[async_trait]
impl VersionRepository for MemoryVersionRepository {
    async fn get(&self, id: &str) -> Result<Option<RequestVersion>, AppError> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn most_recent_by_parent(
        &self,
        parent_id: &str,
    ) -> Result<Option<RequestVersion>, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.parent_id == parent_id)
            .max_by_key(|(seq, r)| (r.modified, *seq))
            .map(|(_, r)| r.clone()))
    }

    async fn all(&self) -> Result<Vec<RequestVersion>, AppError> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, new: NewRequestVersion) -> Result<RequestVersion, AppError> {
        let record = new_record(new);
        self.records.write().await.push(record.clone());
        Ok(record)
    }
}

/// Request store backed by a map keyed on id.
#[derive(Default)]
pub struct MemoryRequestStore {
    requests: RwLock<HashMap<String, Request>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed request, keeping its id and timestamps.
    pub async fn put(&self, request: Request) {
        self.requests
            .write()
            .await
            .insert(request.id.clone(), request);
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<Request>, AppError> {
        Ok(self.requests.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Request>, AppError> {
        let mut requests: Vec<Request> = self.requests.read().await.values().cloned().collect();
        requests.sort_by(|a, b| {
            a.meta_sort_key
                .total_cmp(&b.meta_sort_key)
                .then(a.created.cmp(&b.created))
        });
        Ok(requests)
    }

    async fn insert(&self, new: NewRequest) -> Result<Request, AppError> {
        let request = Request::from_new(new);
        self.put(request.clone()).await;
        Ok(request)
    }

    async fn update(&self, existing: &Request, patch: RequestPatch) -> Result<Request, AppError> {
        let updated = merge(existing, &patch)?;

        let mut requests = self.requests.write().await;
        match requests.get_mut(&existing.id) {
            Some(current) if current.version == existing.version => {
                *current = updated.clone();
                Ok(updated)
            }
            Some(_) => Err(AppError::Conflict(format!(
                "Concurrent modification detected for request {}",
                existing.id
            ))),
            None => Err(AppError::NotFound(format!(
                "Request {} not found",
                existing.id
            ))),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        match self.requests.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Request {} not found", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_most_recent_prefers_last_insert_on_tie() {
        let repo = MemoryVersionRepository::new();
        let mut last = None;
        for payload in ["a", "b", "c"] {
            last = Some(
                repo.insert(NewRequestVersion {
                    parent_id: "req_1".to_string(),
                    compressed_request: payload.to_string(),
                })
                .await
                .unwrap(),
            );
        }

        assert_eq!(repo.most_recent_by_parent("req_1").await.unwrap(), last);
        assert_eq!(repo.count_by_parent("req_1").await, 3);
        assert!(repo.most_recent_by_parent("req_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_update_detects_stale_read() {
        let store = MemoryRequestStore::new();
        let created = store.insert(NewRequest::default()).await.unwrap();

        store
            .update(&created, RequestPatch::new().set("url", "http://y"))
            .await
            .unwrap();

        let err = store
            .update(&created, RequestPatch::new().set("url", "http://z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
