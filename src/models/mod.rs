//! Data models for the request history service.
//!
//! Field names serialize the way request documents are stored: camelCase,
//! with `_id` for identity and `type` for the model discriminator.

mod request;
mod request_version;
mod snapshot;

pub use request::*;
pub use request_version::*;
pub use snapshot::*;

use chrono::Utc;
use uuid::Uuid;

/// Generate a document id of the form `<prefix>_<uuid>`.
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
