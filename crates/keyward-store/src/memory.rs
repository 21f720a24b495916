//! In-process vault.
//!
//! [`MemoryVault`] implements the full [`SecretVault`] matching contract
//! over a mutex-guarded list of attribute sets. It backs the test-suite and
//! any host without a platform vault. Nothing is persisted.
//!
//! Entries carrying an access-control descriptor are only released after
//! the configured [`Authenticator`] succeeds. Without an authenticator,
//! gated entries are readable as-is.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::auth::Authenticator;
use crate::error::{STATUS_PARAM, VaultResult, VaultStatus};
use crate::query::{Attr, Attributes, MatchLimit, Value};
use crate::vault::{QueryResult, SecretVault};

/// `errSecInternalComponent`, reported when the entry list is poisoned.
const STATUS_INTERNAL: i32 = -2070;

/// Prompt used when a gated entry is read without an authentication
/// context.
const DEFAULT_PROMPT: &str = "Authenticate to access this item";

/// Keys persisted with an entry. Everything else shapes a request.
const STORED_KEYS: [Attr; 8] = [
    Attr::Class,
    Attr::Service,
    Attr::Account,
    Attr::AccessGroup,
    Attr::Accessible,
    Attr::AccessControl,
    Attr::ValueData,
    Attr::CreationDate,
];

/// Attribute-keyed secret vault held in memory.
#[derive(Default)]
pub struct MemoryVault {
    entries: Mutex<Vec<Attributes>>,
    authenticator: Option<Box<dyn Authenticator>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route gated reads through `authenticator`.
    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Box::new(authenticator));
        self
    }

    /// Number of stored entries across all groups.
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> VaultResult<MutexGuard<'_, Vec<Attributes>>> {
        self.entries.lock().map_err(|e| {
            tracing::warn!(error = %e, "memory vault mutex poisoned");
            VaultStatus::Other(STATUS_INTERNAL)
        })
    }

    /// Release a gated entry only after a successful ceremony.
    fn authorize(&self, entry: &Attributes, query: &Attributes) -> VaultResult<()> {
        let (Some(ac), Some(auth)) = (entry.access_control(), self.authenticator.as_deref()) else {
            return Ok(());
        };
        let reason = query
            .auth_context()
            .map(|ctx| ctx.reason.as_str())
            .unwrap_or(DEFAULT_PROMPT);
        auth.authenticate(reason, ac.requirement).map_err(|failure| {
            tracing::debug!(%failure, "authentication ceremony did not succeed");
            failure.status()
        })
    }
}

/// Whether `entry` satisfies every match key in `query`.
fn is_match(entry: &Attributes, query: &Attributes) -> bool {
    query
        .iter()
        .filter(|(attr, _)| attr.is_match_key())
        .all(|(attr, value)| entry.get(attr) == Some(value))
}

/// Identity of an entry: class, group, namespace, identifier.
fn same_key(a: &Attributes, b: &Attributes) -> bool {
    [Attr::Class, Attr::AccessGroup, Attr::Service, Attr::Account]
        .into_iter()
        .all(|attr| a.get(attr) == b.get(attr))
}

/// Attribute projection of a stored entry (payload removed).
fn project(entry: &Attributes) -> Attributes {
    let mut projected = entry.clone();
    projected.remove(Attr::ValueData);
    projected.remove(Attr::AccessControl);
    projected
}

impl SecretVault for MemoryVault {
    fn insert(&self, attributes: &Attributes) -> VaultResult<()> {
        let required = [Attr::Class, Attr::Service, Attr::Account];
        if !required.into_iter().all(|attr| attributes.contains(attr)) {
            return Err(VaultStatus::Other(STATUS_PARAM));
        }

        let mut entry = Attributes::new();
        for attr in STORED_KEYS {
            if let Some(value) = attributes.get(attr) {
                entry.insert(attr, value.clone());
            }
        }
        let now = Utc::now();
        entry.insert(Attr::CreationDate, Value::Date(now));
        entry.insert(Attr::ModificationDate, Value::Date(now));

        let mut entries = self.lock()?;
        if entries.iter().any(|existing| same_key(existing, &entry)) {
            return Err(VaultStatus::DuplicateItem);
        }
        entries.push(entry);
        Ok(())
    }

    fn update(&self, query: &Attributes, changes: &Attributes) -> VaultResult<()> {
        // The match predicate may not carry replacement values.
        if query.contains(Attr::ValueData) || query.contains(Attr::Accessible) {
            return Err(VaultStatus::Other(STATUS_PARAM));
        }

        let mut entries = self.lock()?;
        let mut updated = 0usize;
        let now = Utc::now();
        for entry in entries.iter_mut().filter(|e| is_match(e, query)) {
            for (attr, value) in changes.iter() {
                if STORED_KEYS.contains(&attr) && attr != Attr::CreationDate {
                    entry.insert(attr, value.clone());
                }
            }
            entry.insert(Attr::ModificationDate, Value::Date(now));
            updated += 1;
        }

        if updated == 0 {
            return Err(VaultStatus::ItemNotFound);
        }
        Ok(())
    }

    fn query(&self, query: &Attributes) -> VaultResult<QueryResult> {
        let gated = {
            let entries = self.lock()?;
            let mut found: Vec<&Attributes> =
                entries.iter().filter(|e| is_match(e, query)).collect();
            if found.is_empty() {
                return Err(VaultStatus::ItemNotFound);
            }
            if query.match_limit() != Some(MatchLimit::All) {
                found.truncate(1);
            }

            if !query.flag(Attr::ReturnData) {
                if query.flag(Attr::ReturnAttributes) {
                    return Ok(QueryResult::Records(
                        found.into_iter().map(project).collect(),
                    ));
                }
                return Ok(QueryResult::Empty);
            }
            found[0].clone()
        };

        // The ceremony runs without holding the entry lock.
        self.authorize(&gated, query)?;
        let payload = gated
            .data(Attr::ValueData)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        Ok(QueryResult::Payload(payload))
    }

    fn delete(&self, query: &Attributes) -> VaultResult<()> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|e| !is_match(e, query));
        if entries.len() == before {
            return Err(VaultStatus::ItemNotFound);
        }
        Ok(())
    }
}
