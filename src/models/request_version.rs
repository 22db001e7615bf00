//! Request version model: an immutable compressed snapshot of a request.

use serde::{Deserialize, Serialize};

/// Model discriminator stored in `type`.
pub const REQUEST_VERSION_TYPE: &str = "RequestVersion";

/// Id prefix for request versions.
pub const REQUEST_VERSION_ID_PREFIX: &str = "rvr";

/// A persisted version of a request. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestVersion {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Id of the request this version was captured from
    pub parent_id: String,
    pub created: i64,
    pub modified: i64,
    pub compressed_request: String,
}

/// Fields supplied when inserting a version; the repository assigns the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequestVersion {
    pub parent_id: String,
    pub compressed_request: String,
}
