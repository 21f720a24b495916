//! Store configuration.
//!
//! [`StoreConfig`] carries the two knobs a store instance is built with:
//! the optional sharing group and the accessibility applied when a caller
//! does not choose one. It can be built fluently or loaded from TOML:
//!
//! ```toml
//! access_group = "ABCDE12345.com.example.shared"
//! default_accessibility = "afterFirstUnlockThisDeviceOnly"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::policy::Accessibility;

/// Immutable configuration consumed at store construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Sharing group attached to every query issued by the store.
    ///
    /// Default: **none** (the vault's default group).
    pub access_group: Option<String>,

    /// Accessibility seeded into [`SecureItemStore::save_options`].
    ///
    /// Default: **`whenUnlocked`**.
    ///
    /// [`SecureItemStore::save_options`]: crate::store::SecureItemStore::save_options
    pub default_accessibility: Accessibility,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope every query to `group`.
    pub fn with_access_group(mut self, group: impl Into<String>) -> Self {
        self.access_group = Some(group.into());
        self
    }

    pub fn with_default_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.default_accessibility = accessibility;
        self
    }

    /// Parse a TOML document. An empty group string is treated as none.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(input).map_err(|e| StoreError::Config {
            reason: e.to_string(),
        })?;
        if config.access_group.as_deref().is_some_and(str::is_empty) {
            config.access_group = None;
        }
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| StoreError::Config {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(
            path = %path.display(),
            access_group = ?config.access_group,
            "loaded store configuration"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = StoreConfig::default();
        assert!(cfg.access_group.is_none());
        assert_eq!(cfg.default_accessibility, Accessibility::WhenUnlocked);
        assert_eq!(cfg, StoreConfig::new());
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = StoreConfig::new()
            .with_access_group("TEAM.group")
            .with_default_accessibility(Accessibility::AfterFirstUnlock);
        assert_eq!(cfg.access_group.as_deref(), Some("TEAM.group"));
        assert_eq!(cfg.default_accessibility, Accessibility::AfterFirstUnlock);
    }

    #[test]
    fn parse_toml() {
        let cfg = StoreConfig::from_toml_str(
            r#"
            access_group = "TEAM.group"
            default_accessibility = "whenPasscodeSet"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.access_group.as_deref(), Some("TEAM.group"));
        assert_eq!(cfg.default_accessibility, Accessibility::WhenPasscodeSet);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(StoreConfig::from_toml_str("").unwrap(), StoreConfig::default());
    }

    #[test]
    fn empty_group_is_none() {
        let cfg = StoreConfig::from_toml_str("access_group = \"\"").unwrap();
        assert!(cfg.access_group.is_none());
    }

    #[test]
    fn unknown_field_rejected() {
        let err = StoreConfig::from_toml_str("sharing = \"x\"").unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn unknown_policy_rejected() {
        let err = StoreConfig::from_toml_str("default_accessibility = \"always\"").unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(&path, "access_group = \"shared\"\n").unwrap();

        let cfg = StoreConfig::load(&path).unwrap();
        assert_eq!(cfg.access_group.as_deref(), Some("shared"));
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }
}
