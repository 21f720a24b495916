//! Typed secure item store for Keyward.
//!
//! This crate layers typed save/read/update/delete/list operations over an
//! opaque protected-storage primitive: a secret vault keyed by item class,
//! a service namespace and an account identifier, with per-entry
//! accessibility policies and optional biometric gating.
//!
//! The vault itself, the payload codec and the authentication ceremony are
//! collaborators behind traits; the crate's own work is building
//! well-formed queries, the upsert flow, and mapping vault statuses onto a
//! small error taxonomy.
//!
//! # Modules
//!
//! - [`store`]: [`SecureItemStore`], blocking operations and `_async` twins.
//! - [`query`]: attribute vocabulary and [`QueryBuilder`].
//! - [`policy`]: accessibility policies and biometric gates.
//! - [`record`]: [`ItemRecord`] metadata returned by listing.
//! - [`vault`]: the [`SecretVault`] trait.
//! - [`memory`]: [`MemoryVault`], an in-process vault.
//! - [`auth`]: the [`Authenticator`] ceremony seam.
//! - [`codec`]: payload serialization, [`JsonCodec`] by default.
//! - [`config`]: [`StoreConfig`].
//! - [`error`]: [`StoreError`] and vault statuses.
//!
//! # Quick Start
//!
//! ```rust
//! use keyward_store::{Accessibility, MemoryVault, SaveOptions, SecureItemStore, StoreError};
//!
//! # fn example() -> keyward_store::Result<()> {
//! let store = SecureItemStore::new(MemoryVault::new());
//!
//! let options = SaveOptions::new().with_accessibility(Accessibility::AfterFirstUnlock);
//! store.save(&vec!["a", "b"], "sync", "cursor", &options)?;
//!
//! let cursor: Vec<String> = store.read("sync", "cursor", None)?;
//! assert_eq!(cursor, ["a", "b"]);
//!
//! // Same entry, wrong shape.
//! let wrong = store.read::<u64>("sync", "cursor", None);
//! assert!(matches!(wrong, Err(StoreError::InvalidData { .. })));
//!
//! assert_eq!(store.list_all(Some("sync"))?.len(), 1);
//! store.delete_all(None)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod memory;
pub mod policy;
pub mod query;
pub mod record;
pub mod store;
pub mod vault;

pub use auth::{AuthContext, AuthFailure, Authenticator};
pub use codec::{Codec, CodecError, JsonCodec};
pub use config::StoreConfig;
pub use error::{Result, StoreError, VaultStatus};
pub use memory::MemoryVault;
pub use policy::{AccessControl, Accessibility, AuthRequirement, BiometricGate};
pub use query::{Attr, Attributes, QueryBuilder, Value};
pub use record::ItemRecord;
pub use store::{SaveOptions, SecureItemStore};
pub use vault::{QueryResult, SecretVault};
