//! Name generators
//!
//! A name generator maps the untrusted client-supplied filename to the name
//! the file is stored under. Generators are pure (no I/O) and must return a
//! non-empty, storage-safe string.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

/// A name-generation function applied to the original filename.
pub type NameGeneratorFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// The default generator. Produces `stowage-{unix_timestamp}-{original}`,
/// which keeps the original name visible while making collisions unlikely.
pub fn timestamp_names() -> NameGeneratorFn {
    Arc::new(|original| format!("stowage-{}-{}", Utc::now().timestamp(), original))
}

/// Generates a random UUID v4 per file, discarding the original name.
/// Collision-resistant but non-deterministic.
pub fn uuid_names() -> NameGeneratorFn {
    Arc::new(|_| Uuid::new_v4().to_string())
}
