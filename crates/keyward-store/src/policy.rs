//! Accessibility policies and biometric gating.
//!
//! An [`Accessibility`] decides when a stored item may be read and whether
//! it may replicate to a synced copy of the vault. A [`BiometricGate`]
//! optionally requires an interactive authentication ceremony before the
//! item is released; on write it is turned into an [`AccessControl`]
//! descriptor that travels with the entry.
//!
//! # Passcode variants
//!
//! The vault has no synchronizable passcode protection class. Both
//! [`Accessibility::WhenPasscodeSet`] and
//! [`Accessibility::WhenPasscodeSetThisDeviceOnly`] therefore alias the
//! same device-local constant, and [`Accessibility::canonical`] folds the
//! former into the latter before anything reaches a query.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Accessibility
// ---------------------------------------------------------------------------

/// When an item is readable, and whether it may sync off this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Accessibility {
    /// Readable while the device is unlocked. May sync.
    #[default]
    WhenUnlocked,
    /// Readable after the first unlock following a restart. May sync.
    AfterFirstUnlock,
    /// Readable while unlocked, only if a passcode is set. Never syncs.
    WhenPasscodeSet,
    /// Like [`WhenUnlocked`](Self::WhenUnlocked), never syncs.
    WhenUnlockedThisDeviceOnly,
    /// Like [`AfterFirstUnlock`](Self::AfterFirstUnlock), never syncs.
    AfterFirstUnlockThisDeviceOnly,
    /// Readable while unlocked, only if a passcode is set. Never syncs.
    WhenPasscodeSetThisDeviceOnly,
}

/// The lock-state condition an [`Accessibility`] imposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnlockRequirement {
    WhenUnlocked,
    AfterFirstUnlock,
    PasscodeSet,
}

impl Accessibility {
    /// Every policy, in declaration order.
    pub const ALL: [Accessibility; 6] = [
        Self::WhenUnlocked,
        Self::AfterFirstUnlock,
        Self::WhenPasscodeSet,
        Self::WhenUnlockedThisDeviceOnly,
        Self::AfterFirstUnlockThisDeviceOnly,
        Self::WhenPasscodeSetThisDeviceOnly,
    ];

    /// Fold aliases onto a single representative.
    pub fn canonical(self) -> Self {
        match self {
            Self::WhenPasscodeSet => Self::WhenPasscodeSetThisDeviceOnly,
            other => other,
        }
    }

    /// The vault's protection-class constant (`kSecAttrAccessible*`).
    pub fn attribute_value(self) -> &'static str {
        match self.canonical() {
            Self::WhenUnlocked => "ak",
            Self::AfterFirstUnlock => "ck",
            Self::WhenUnlockedThisDeviceOnly => "aku",
            Self::AfterFirstUnlockThisDeviceOnly => "cku",
            Self::WhenPasscodeSet | Self::WhenPasscodeSetThisDeviceOnly => "akpu",
        }
    }

    /// Parse a protection-class constant. Passcode entries come back as the
    /// canonical device-local variant.
    pub fn from_attribute_value(value: &str) -> Option<Self> {
        match value {
            "ak" => Some(Self::WhenUnlocked),
            "ck" => Some(Self::AfterFirstUnlock),
            "aku" => Some(Self::WhenUnlockedThisDeviceOnly),
            "cku" => Some(Self::AfterFirstUnlockThisDeviceOnly),
            "akpu" => Some(Self::WhenPasscodeSetThisDeviceOnly),
            _ => None,
        }
    }

    pub fn unlock_requirement(self) -> UnlockRequirement {
        match self {
            Self::WhenUnlocked | Self::WhenUnlockedThisDeviceOnly => UnlockRequirement::WhenUnlocked,
            Self::AfterFirstUnlock | Self::AfterFirstUnlockThisDeviceOnly => {
                UnlockRequirement::AfterFirstUnlock
            }
            Self::WhenPasscodeSet | Self::WhenPasscodeSetThisDeviceOnly => {
                UnlockRequirement::PasscodeSet
            }
        }
    }

    /// Whether entries with this policy may replicate to a synced vault.
    pub fn is_synchronizable(self) -> bool {
        matches!(self, Self::WhenUnlocked | Self::AfterFirstUnlock)
    }
}

impl std::fmt::Display for Accessibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.attribute_value())
    }
}

// ---------------------------------------------------------------------------
// Biometric gate
// ---------------------------------------------------------------------------

/// Whether a biometric or passcode ceremony must succeed before an item is
/// released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricGate {
    /// Only a gate with `required = true` has any effect.
    pub required: bool,

    /// Allow the device passcode when biometry is unavailable or fails.
    pub fallback_to_passcode: bool,

    /// Text shown to the user during the ceremony.
    pub localized_reason: String,
}

impl BiometricGate {
    /// A required gate that falls back to the passcode.
    pub fn required(localized_reason: impl Into<String>) -> Self {
        Self {
            required: true,
            fallback_to_passcode: true,
            localized_reason: localized_reason.into(),
        }
    }

    /// Disallow the passcode fallback (biometry only).
    pub fn without_fallback(mut self) -> Self {
        self.fallback_to_passcode = false;
        self
    }

    /// Derive the access-control descriptor to attach on insert, if any.
    pub fn access_control(&self, accessibility: Accessibility) -> Option<AccessControl> {
        if !self.required {
            return None;
        }
        let requirement = if self.fallback_to_passcode {
            AuthRequirement::UserPresence
        } else {
            AuthRequirement::BiometryAny
        };
        Some(AccessControl {
            protection: accessibility.canonical(),
            requirement,
        })
    }
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

/// What the ceremony must prove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthRequirement {
    /// Biometry, or the device passcode as a fallback.
    UserPresence,
    /// Any enrolled biometry, no passcode fallback.
    BiometryAny,
}

impl AuthRequirement {
    /// Whether the passcode is an acceptable substitute for biometry.
    pub fn allows_passcode(self) -> bool {
        matches!(self, Self::UserPresence)
    }
}

/// Access-control descriptor stored alongside a gated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessControl {
    pub protection: Accessibility,
    pub requirement: AuthRequirement,
}
