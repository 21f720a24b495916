//! Read-only metadata projection returned by enumeration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{Attr, Attributes};

/// Metadata for one stored entry, without its payload.
///
/// Records are only ever produced by listing; they cannot be used to
/// mutate the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Namespace (service) as stored, i.e. lower-cased.
    pub namespace: String,

    /// Identifier (account) as stored, i.e. lower-cased.
    pub identifier: String,

    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl ItemRecord {
    /// Project a vault attribute set. Returns `None` if the namespace or
    /// identifier attribute is missing.
    pub fn from_attributes(attributes: &Attributes) -> Option<Self> {
        let namespace = attributes.text(Attr::Service)?.to_owned();
        let identifier = attributes.text(Attr::Account)?.to_owned();
        Some(Self {
            namespace,
            identifier,
            created_at: attributes.date(Attr::CreationDate),
            modified_at: attributes.date(Attr::ModificationDate),
        })
    }
}
