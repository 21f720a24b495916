//! Store error types and vault status classification.
//!
//! Every public operation on the store surfaces failures through
//! [`StoreError`]. The vault itself reports a [`VaultStatus`] for any
//! non-success outcome; [`StoreError::from_status`] is the single place
//! those statuses are mapped onto the taxonomy.

/// Numeric code the vault uses for success.
pub const STATUS_SUCCESS: i32 = 0;

/// `errSecItemNotFound`.
pub const STATUS_ITEM_NOT_FOUND: i32 = -25300;

/// `errSecDuplicateItem`.
pub const STATUS_DUPLICATE_ITEM: i32 = -25299;

/// `errSecAuthFailed`.
pub const STATUS_AUTH_FAILED: i32 = -25293;

/// `errSecParam`.
pub const STATUS_PARAM: i32 = -50;

/// A non-success status reported by the vault.
///
/// Success is represented by `Ok(..)` on the vault trait, so there is no
/// success variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultStatus {
    /// No entry matched the query.
    ItemNotFound,
    /// An entry with the same primary key already exists.
    DuplicateItem,
    /// Any other failure, carrying the vault's raw code.
    Other(i32),
}

impl VaultStatus {
    /// The raw numeric code for this status.
    pub fn code(self) -> i32 {
        match self {
            Self::ItemNotFound => STATUS_ITEM_NOT_FOUND,
            Self::DuplicateItem => STATUS_DUPLICATE_ITEM,
            Self::Other(code) => code,
        }
    }

    /// Classify a raw vault code. Returns `None` for success.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            STATUS_SUCCESS => None,
            STATUS_ITEM_NOT_FOUND => Some(Self::ItemNotFound),
            STATUS_DUPLICATE_ITEM => Some(Self::DuplicateItem),
            other => Some(Self::Other(other)),
        }
    }
}

impl std::fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "item not found ({})", self.code()),
            Self::DuplicateItem => write!(f, "duplicate item ({})", self.code()),
            Self::Other(code) => write!(f, "status {code}"),
        }
    }
}

/// Result alias for raw vault calls.
pub type VaultResult<T> = std::result::Result<T, VaultStatus>;

/// Unified error type for the secure item store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No entry exists for the requested namespace and identifier.
    #[error("item not found")]
    ItemNotFound,

    /// The entry exists but its payload could not be decoded into the
    /// requested type (or a value could not be encoded on write).
    #[error("invalid item data: {reason}")]
    InvalidData { reason: String },

    /// An entry already exists. Only reachable through [`create`], which
    /// does not upsert.
    ///
    /// [`create`]: crate::store::SecureItemStore::create
    #[error("item already exists")]
    DuplicateItem,

    /// Any other non-success status from the vault.
    #[error("vault operation failed with status {status}")]
    StoreFailure { status: i32 },

    /// The store configuration could not be read or parsed.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The worker running an async operation panicked or was torn down.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl StoreError {
    /// Map a vault status onto the taxonomy.
    pub fn from_status(status: VaultStatus) -> Self {
        match status {
            VaultStatus::ItemNotFound => Self::ItemNotFound,
            VaultStatus::DuplicateItem => Self::DuplicateItem,
            VaultStatus::Other(code) => Self::StoreFailure { status: code },
        }
    }

    /// Wrap a status as an opaque failure, regardless of its kind.
    ///
    /// Used where not-found or duplicate carry no special meaning for the
    /// calling operation.
    pub fn failure(status: VaultStatus) -> Self {
        Self::StoreFailure {
            status: status.code(),
        }
    }

    /// The raw vault status, if this error came from one.
    pub fn status(&self) -> Option<i32> {
        match self {
            Self::ItemNotFound => Some(STATUS_ITEM_NOT_FOUND),
            Self::DuplicateItem => Some(STATUS_DUPLICATE_ITEM),
            Self::StoreFailure { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

/// Convenience alias used throughout the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;
