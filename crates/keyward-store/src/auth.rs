//! Authentication ceremony seam.
//!
//! The store never drives a biometric prompt itself. On read it attaches an
//! [`AuthContext`] carrying the reason to show; the vault hands gated
//! entries to an [`Authenticator`] which performs the ceremony and reports
//! the outcome before the payload is released.

use crate::error::{STATUS_AUTH_FAILED, VaultStatus};
use crate::policy::AuthRequirement;

/// `errSecUserCanceled`.
pub const STATUS_USER_CANCELED: i32 = -128;

/// `errSecNotAvailable`.
pub const STATUS_NOT_AVAILABLE: i32 = -25291;

/// Authentication context attached to a read query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthContext {
    /// Human-readable reason shown during the ceremony.
    pub reason: String,
}

impl AuthContext {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Why a ceremony did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("authentication cancelled by user")]
    Cancelled,
    #[error("authentication failed")]
    Failed,
    #[error("no authentication method available")]
    Unavailable,
}

impl AuthFailure {
    /// The vault status a failed ceremony is reported as.
    pub fn status(self) -> VaultStatus {
        match self {
            Self::Cancelled => VaultStatus::Other(STATUS_USER_CANCELED),
            Self::Failed => VaultStatus::Other(STATUS_AUTH_FAILED),
            Self::Unavailable => VaultStatus::Other(STATUS_NOT_AVAILABLE),
        }
    }
}

/// Performs an interactive authentication challenge.
///
/// Implementations block until the user completes or dismisses the
/// ceremony; the system-level timeout of the ceremony governs, there is
/// no override here.
pub trait Authenticator: Send + Sync {
    fn authenticate(
        &self,
        reason: &str,
        requirement: AuthRequirement,
    ) -> std::result::Result<(), AuthFailure>;
}
