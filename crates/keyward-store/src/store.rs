//! The secure item store.
//!
//! [`SecureItemStore`] turns typed operations into vault queries built by
//! [`QueryBuilder`] and classifies the vault's statuses into
//! [`StoreError`]. It holds no mutable state: a store is a sharing group,
//! a codec and a handle to the vault, and clones share all three.
//!
//! Every operation has a blocking form and an `_async` twin. The twin moves
//! its arguments onto the blocking pool via `tokio::task::spawn_blocking`
//! and runs the same blocking body exactly once. Nothing is retried and
//! nothing can be cancelled once dispatched.
//!
//! # Upsert
//!
//! [`save`](SecureItemStore::save) tries an update first and inserts only
//! when the vault reports the entry missing. Updating first keeps any
//! access-control descriptor already attached to the entry. The two calls
//! are not atomic: a delete racing between them makes the insert succeed
//! as a fresh entry. The vault offers no primitive to close that window.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{Codec, JsonCodec};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError, VaultStatus};
use crate::policy::{Accessibility, BiometricGate};
use crate::query::{QueryBuilder, normalize};
use crate::record::ItemRecord;
use crate::vault::{QueryResult, SecretVault};

// ---------------------------------------------------------------------------
// Save options
// ---------------------------------------------------------------------------

/// Protection applied when an entry is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Default: **`whenUnlocked`**.
    pub accessibility: Accessibility,

    /// Only honoured when the entry is created; an update keeps the
    /// existing access control.
    pub biometric: Option<BiometricGate>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_biometric(mut self, gate: BiometricGate) -> Self {
        self.biometric = Some(gate);
        self
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Typed save/read/delete/list over a [`SecretVault`].
///
/// # Example
///
/// ```rust
/// use keyward_store::{MemoryVault, SaveOptions, SecureItemStore};
///
/// # fn example() -> keyward_store::Result<()> {
/// let store = SecureItemStore::new(MemoryVault::new());
///
/// store.save(&"sk-live-123", "Payments", "api-key", &SaveOptions::default())?;
/// let key: String = store.read("payments", "API-KEY", None)?;
/// assert_eq!(key, "sk-live-123");
///
/// store.delete("payments", "api-key")?;
/// assert!(!store.exists("payments", "api-key"));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct SecureItemStore<V, C = JsonCodec> {
    vault: Arc<V>,
    codec: Arc<C>,
    queries: QueryBuilder,
    default_accessibility: Accessibility,
}

impl<V, C> Clone for SecureItemStore<V, C> {
    fn clone(&self) -> Self {
        Self {
            vault: Arc::clone(&self.vault),
            codec: Arc::clone(&self.codec),
            queries: self.queries.clone(),
            default_accessibility: self.default_accessibility,
        }
    }
}

impl<V: SecretVault> SecureItemStore<V, JsonCodec> {
    /// A store with no sharing group and JSON payloads.
    pub fn new(vault: V) -> Self {
        Self::with_config(vault, JsonCodec, StoreConfig::default())
    }
}

impl<V: SecretVault, C: Codec> SecureItemStore<V, C> {
    pub fn with_config(vault: V, codec: C, config: StoreConfig) -> Self {
        tracing::debug!(
            access_group = ?config.access_group,
            default_accessibility = %config.default_accessibility,
            "creating secure item store"
        );
        Self {
            vault: Arc::new(vault),
            codec: Arc::new(codec),
            queries: QueryBuilder::new(config.access_group),
            default_accessibility: config.default_accessibility,
        }
    }

    /// The sharing group every query is scoped to.
    pub fn access_group(&self) -> Option<&str> {
        self.queries.access_group()
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Save options seeded with the configured default accessibility.
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions::default().with_accessibility(self.default_accessibility)
    }

    fn encode<T: Serialize + ?Sized>(&self, item: &T) -> Result<Vec<u8>> {
        self.codec
            .encode(item)
            .map_err(|e| StoreError::InvalidData { reason: e.0 })
    }

    // -- Writes -------------------------------------------------------------

    /// Store `item`, replacing any existing entry for the same namespace
    /// and identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreFailure`] for any vault status other
    /// than the not-found that triggers the insert, and
    /// [`StoreError::InvalidData`] if `item` cannot be encoded.
    pub fn save<T: Serialize + ?Sized>(
        &self,
        item: &T,
        namespace: &str,
        identifier: &str,
        options: &SaveOptions,
    ) -> Result<()> {
        let payload = self.encode(item)?;
        let lookup = self.queries.lookup(namespace, identifier);
        let changes = self
            .queries
            .update_attributes(payload.clone(), options.accessibility);

        match self.vault.update(&lookup, &changes) {
            Ok(()) => {
                tracing::info!(namespace, identifier, "updated item");
                Ok(())
            }
            Err(VaultStatus::ItemNotFound) => {
                let attributes = self.queries.insert(
                    namespace,
                    identifier,
                    payload,
                    options.accessibility,
                    options.biometric.as_ref(),
                );
                self.vault.insert(&attributes).map_err(|status| {
                    tracing::warn!(namespace, identifier, %status, "insert after missed update failed");
                    StoreError::failure(status)
                })?;
                tracing::info!(
                    namespace,
                    identifier,
                    accessibility = %options.accessibility,
                    gated = attributes.access_control().is_some(),
                    "inserted item"
                );
                Ok(())
            }
            Err(status) => {
                tracing::warn!(namespace, identifier, %status, "update failed");
                Err(StoreError::failure(status))
            }
        }
    }

    /// Store `item` only if no entry exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateItem`] if the entry already exists.
    pub fn create<T: Serialize + ?Sized>(
        &self,
        item: &T,
        namespace: &str,
        identifier: &str,
        options: &SaveOptions,
    ) -> Result<()> {
        let payload = self.encode(item)?;
        let attributes = self.queries.insert(
            namespace,
            identifier,
            payload,
            options.accessibility,
            options.biometric.as_ref(),
        );
        self.vault
            .insert(&attributes)
            .map_err(StoreError::from_status)?;
        tracing::info!(namespace, identifier, "created item");
        Ok(())
    }

    /// Replace the payload and accessibility of an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if there is nothing to replace.
    pub fn update<T: Serialize + ?Sized>(
        &self,
        item: &T,
        namespace: &str,
        identifier: &str,
        accessibility: Accessibility,
    ) -> Result<()> {
        let payload = self.encode(item)?;
        self.vault
            .update(
                &self.queries.lookup(namespace, identifier),
                &self.queries.update_attributes(payload, accessibility),
            )
            .map_err(StoreError::from_status)?;
        tracing::info!(namespace, identifier, "updated item");
        Ok(())
    }

    /// Remove one entry. Removing an absent entry succeeds.
    pub fn delete(&self, namespace: &str, identifier: &str) -> Result<()> {
        match self.vault.delete(&self.queries.lookup(namespace, identifier)) {
            Ok(()) => {
                tracing::info!(namespace, identifier, "deleted item");
                Ok(())
            }
            Err(VaultStatus::ItemNotFound) => {
                tracing::debug!(namespace, identifier, "delete found nothing");
                Ok(())
            }
            Err(status) => Err(StoreError::failure(status)),
        }
    }

    /// Remove every entry in the store's group, or only those under
    /// `namespace`. Finding nothing to remove succeeds.
    pub fn delete_all(&self, namespace: Option<&str>) -> Result<()> {
        match self.vault.delete(&self.queries.enumeration_filter(namespace)) {
            Ok(()) => {
                tracing::info!(namespace = ?namespace.map(normalize), "deleted items");
                Ok(())
            }
            Err(VaultStatus::ItemNotFound) => Ok(()),
            Err(status) => Err(StoreError::failure(status)),
        }
    }

    // -- Reads --------------------------------------------------------------

    /// Fetch and decode an entry.
    ///
    /// With `auth_reason`, gated entries are released after an
    /// authentication ceremony showing that reason.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ItemNotFound`] if nothing was ever stored.
    /// - [`StoreError::InvalidData`] if the payload does not decode as `T`.
    /// - [`StoreError::StoreFailure`] for other statuses, including a
    ///   failed ceremony.
    pub fn read<T: DeserializeOwned>(
        &self,
        namespace: &str,
        identifier: &str,
        auth_reason: Option<&str>,
    ) -> Result<T> {
        let query = self.queries.read(namespace, identifier, auth_reason);
        let payload = match self.vault.query(&query) {
            Ok(QueryResult::Payload(bytes)) => bytes,
            Ok(_) => {
                return Err(StoreError::InvalidData {
                    reason: "vault returned no payload".into(),
                });
            }
            Err(status) => return Err(StoreError::from_status(status)),
        };
        tracing::debug!(namespace, identifier, "read item");

        self.codec.decode(&payload).map_err(|e| {
            tracing::warn!(namespace, identifier, error = %e, "stored payload did not decode");
            StoreError::InvalidData { reason: e.0 }
        })
    }

    /// Metadata of a single entry.
    pub fn read_record(&self, namespace: &str, identifier: &str) -> Result<ItemRecord> {
        let records = match self.vault.query(&self.queries.record(namespace, identifier)) {
            Ok(QueryResult::Records(records)) => records,
            Ok(_) => Vec::new(),
            Err(status) => return Err(StoreError::from_status(status)),
        };
        let first = records.first().ok_or(StoreError::ItemNotFound)?;
        ItemRecord::from_attributes(first).ok_or_else(|| StoreError::InvalidData {
            reason: "entry is missing namespace or identifier".into(),
        })
    }

    /// Whether an entry exists. Every failure, including malformed input,
    /// reads as `false`.
    pub fn exists(&self, namespace: &str, identifier: &str) -> bool {
        let found = self
            .vault
            .query(&self.queries.existence(namespace, identifier))
            .is_ok();
        tracing::debug!(namespace, identifier, found, "checked item");
        found
    }

    /// Metadata for every entry in the store's group, optionally limited to
    /// one namespace.
    ///
    /// Entries missing their namespace or identifier are skipped.
    pub fn list_all(&self, namespace: Option<&str>) -> Result<Vec<ItemRecord>> {
        let raw = match self.vault.query(&self.queries.enumerate(namespace)) {
            Ok(QueryResult::Records(records)) => records,
            Ok(_) | Err(VaultStatus::ItemNotFound) => Vec::new(),
            Err(status) => return Err(StoreError::failure(status)),
        };

        let total = raw.len();
        let records: Vec<ItemRecord> = raw.iter().filter_map(ItemRecord::from_attributes).collect();
        if records.len() < total {
            tracing::warn!(
                dropped = total - records.len(),
                "skipped malformed vault entries while listing"
            );
        }
        tracing::debug!(count = records.len(), "listed items");
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Async twins
// ---------------------------------------------------------------------------

impl<V: SecretVault + 'static, C: Codec> SecureItemStore<V, C> {
    /// Run `op` against a clone of this store on the blocking pool.
    async fn dispatch<R, F>(&self, op: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&Self) -> R + Send + 'static,
    {
        let store = self.clone();
        Ok(tokio::task::spawn_blocking(move || op(&store)).await?)
    }

    pub async fn save_async<T>(
        &self,
        item: T,
        namespace: impl Into<String>,
        identifier: impl Into<String>,
        options: SaveOptions,
    ) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let (namespace, identifier) = (namespace.into(), identifier.into());
        self.dispatch(move |store| store.save(&item, &namespace, &identifier, &options))
            .await?
    }

    pub async fn create_async<T>(
        &self,
        item: T,
        namespace: impl Into<String>,
        identifier: impl Into<String>,
        options: SaveOptions,
    ) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let (namespace, identifier) = (namespace.into(), identifier.into());
        self.dispatch(move |store| store.create(&item, &namespace, &identifier, &options))
            .await?
    }

    pub async fn update_async<T>(
        &self,
        item: T,
        namespace: impl Into<String>,
        identifier: impl Into<String>,
        accessibility: Accessibility,
    ) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let (namespace, identifier) = (namespace.into(), identifier.into());
        self.dispatch(move |store| store.update(&item, &namespace, &identifier, accessibility))
            .await?
    }

    pub async fn read_async<T>(
        &self,
        namespace: impl Into<String>,
        identifier: impl Into<String>,
        auth_reason: Option<String>,
    ) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (namespace, identifier) = (namespace.into(), identifier.into());
        self.dispatch(move |store| store.read(&namespace, &identifier, auth_reason.as_deref()))
            .await?
    }

    pub async fn read_record_async(
        &self,
        namespace: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Result<ItemRecord> {
        let (namespace, identifier) = (namespace.into(), identifier.into());
        self.dispatch(move |store| store.read_record(&namespace, &identifier))
            .await?
    }

    pub async fn delete_async(
        &self,
        namespace: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Result<()> {
        let (namespace, identifier) = (namespace.into(), identifier.into());
        self.dispatch(move |store| store.delete(&namespace, &identifier))
            .await?
    }

    /// A worker that dies before answering also reads as `false`.
    pub async fn exists_async(
        &self,
        namespace: impl Into<String>,
        identifier: impl Into<String>,
    ) -> bool {
        let (namespace, identifier) = (namespace.into(), identifier.into());
        self.dispatch(move |store| store.exists(&namespace, &identifier))
            .await
            .unwrap_or(false)
    }

    pub async fn list_all_async(&self, namespace: Option<String>) -> Result<Vec<ItemRecord>> {
        self.dispatch(move |store| store.list_all(namespace.as_deref()))
            .await?
    }

    pub async fn delete_all_async(&self, namespace: Option<String>) -> Result<()> {
        self.dispatch(move |store| store.delete_all(namespace.as_deref()))
            .await?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
