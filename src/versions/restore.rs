//! Rolling a request back to a recorded version.

use std::sync::Arc;

use crate::db::RequestStore;
use crate::errors::AppError;
use crate::models::Request;

use super::store::VersionStore;

/// Applies stored versions back onto live requests.
#[derive(Clone)]
pub struct Restorer {
    versions: VersionStore,
    requests: Arc<dyn RequestStore>,
}

impl Restorer {
    pub fn new(versions: VersionStore, requests: Arc<dyn RequestStore>) -> Self {
        Self { versions, requests }
    }

    /// Restore the request captured in version `version_id`.
    ///
    /// Identity and display metadata of the live request are kept; every
    /// other captured field is written back. Returns `None` when the version
    /// or its request no longer exists, including a request deleted while the
    /// restore was in flight. A concurrent edit fails with
    /// [`AppError::Conflict`].
    pub async fn restore(&self, version_id: &str) -> Result<Option<Request>, AppError> {
        // Older data may predate version tracking
        let Some(version) = self.versions.get_by_id(version_id).await? else {
            tracing::warn!("Request version {} not found, nothing to restore", version_id);
            return Ok(None);
        };

        let snapshot = self.versions.snapshot(&version)?;
        let Some(request_id) = snapshot.id().map(str::to_string) else {
            return Err(AppError::Codec(format!(
                "Request version {} has no request id",
                version.id
            )));
        };

        let Some(original) = self.requests.get_by_id(&request_id).await? else {
            tracing::warn!(
                "Request {} of version {} no longer exists",
                request_id,
                version.id
            );
            return Ok(None);
        };

        let patch = snapshot.into_patch().without_excluded();
        let restored = match self.requests.update(&original, patch).await {
            Ok(restored) => restored,
            Err(AppError::NotFound(_)) => {
                tracing::warn!(
                    "Request {} was deleted before version {} could be restored",
                    request_id,
                    version.id
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        tracing::info!("Restored request {} to version {}", restored.id, version.id);
        Ok(Some(restored))
    }
}
