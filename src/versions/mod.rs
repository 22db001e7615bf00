//! Request versioning: change detection, deduplicated version storage and
//! restore.

pub mod differ;
mod lock;
mod restore;
mod store;

pub use differ::has_changed;
pub use lock::{KeyedGuard, KeyedLocks};
pub use restore::Restorer;
pub use store::VersionStore;
