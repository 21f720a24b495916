//! The protected-storage primitive the store is layered over.
//!
//! [`SecretVault`] is the only I/O boundary of this crate. It mirrors the
//! four item primitives of a platform keychain: insert, update,
//! query-matching and delete, each keyed by an [`Attributes`] dictionary.
//! Success is `Ok(..)`; every other outcome is a [`VaultStatus`].

use crate::error::VaultResult;
use crate::query::Attributes;

/// What a matching query returned.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Neither payload nor attributes were requested.
    Empty,
    /// The payload of the first match.
    Payload(Vec<u8>),
    /// One attribute projection per match (a single one under
    /// match-limit one).
    Records(Vec<Attributes>),
}

/// Abstraction over a keyed secret vault.
///
/// Implementations must be `Send + Sync`; the store shares one vault across
/// threads and blocking worker tasks. Conflicting concurrent writes are
/// serialized by the vault itself.
pub trait SecretVault: Send + Sync {
    /// Add a new entry described by `attributes`.
    ///
    /// Fails with [`VaultStatus::DuplicateItem`] if the primary key exists.
    ///
    /// [`VaultStatus::DuplicateItem`]: crate::error::VaultStatus::DuplicateItem
    fn insert(&self, attributes: &Attributes) -> VaultResult<()>;

    /// Replace `changes` on every entry matching `query`.
    fn update(&self, query: &Attributes, changes: &Attributes) -> VaultResult<()>;

    /// Find entries matching `query`. Return flags and the match limit are
    /// carried inside the query itself.
    fn query(&self, query: &Attributes) -> VaultResult<QueryResult>;

    /// Remove every entry matching `query`.
    fn delete(&self, query: &Attributes) -> VaultResult<()>;
}

impl<V: SecretVault + ?Sized> SecretVault for std::sync::Arc<V> {
    fn insert(&self, attributes: &Attributes) -> VaultResult<()> {
        (**self).insert(attributes)
    }

    fn update(&self, query: &Attributes, changes: &Attributes) -> VaultResult<()> {
        (**self).update(query, changes)
    }

    fn query(&self, query: &Attributes) -> VaultResult<QueryResult> {
        (**self).query(query)
    }

    fn delete(&self, query: &Attributes) -> VaultResult<()> {
        (**self).delete(query)
    }
}

impl<V: SecretVault + ?Sized> SecretVault for Box<V> {
    fn insert(&self, attributes: &Attributes) -> VaultResult<()> {
        (**self).insert(attributes)
    }

    fn update(&self, query: &Attributes, changes: &Attributes) -> VaultResult<()> {
        (**self).update(query, changes)
    }

    fn query(&self, query: &Attributes) -> VaultResult<QueryResult> {
        (**self).query(query)
    }

    fn delete(&self, query: &Attributes) -> VaultResult<()> {
        (**self).delete(query)
    }
}
