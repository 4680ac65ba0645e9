//! Opaque records and the collections that hold them.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A single row of a collection.
///
/// Records are opaque to the backup pipeline: they are read, copied into a
/// snapshot, and never interpreted.
pub type Record = serde_json::Value;

/// Name of a collection (table) in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(Cow<'static, str>);

impl Collection {
    /// Storage containers (boxes, racks), backed up nightly.
    pub const CONTAINERS: Collection = Collection(Cow::Borrowed("containers"));
    /// Samples placed in containers, backed up nightly.
    pub const SAMPLES: Collection = Collection(Cow::Borrowed("samples"));
    /// Snapshot records written by the backup job.
    pub const BACKUPS: Collection = Collection(Cow::Borrowed("backups"));
    /// Initials/tokens allowed to use the app; read by the debug listing.
    pub const AUTHORIZED_USERS: Collection = Collection(Cow::Borrowed("authorized_users"));

    /// Build a collection name, rejecting anything that is not a plain
    /// identifier (it ends up as a URL path segment).
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(DomainError::InvalidCollection(name));
        }
        Ok(Self(Cow::Owned(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
