use std::collections::BTreeMap;

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 128;
pub const MAX_VALUE_LENGTH: usize = 4096;

/// Preference keys. Values are plain strings; boolean flags store `"true"`.
pub mod keys {
    pub const LANGUAGE: &str = "language";
    pub const LANGUAGE_SELECTED: &str = "language_selected";
    pub const THEME: &str = "theme";
    pub const THEME_SELECTED: &str = "theme_selected";
    pub const VIEW_TYPE: &str = "view_type";
    pub const ONBOARDING_COMPLETED: &str = "onboarding_completed";
    pub const CURRENT_USER: &str = "current_user";
    pub const ADMIN_VERIFIED: &str = "admin_verified";

    pub const ALL: &[&str] = &[
        LANGUAGE,
        LANGUAGE_SELECTED,
        THEME,
        THEME_SELECTED,
        VIEW_TYPE,
        ONBOARDING_COMPLETED,
        CURRENT_USER,
        ADMIN_VERIFIED,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefsSnapshot {
    pub entries: BTreeMap<String, String>,
}

impl PrefsSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Boolean flags are stored as the literal string `"true"`; anything
    /// else (including absence) reads as `false`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum PrefsOperation {
    /// Read every known preference key in one round trip at startup.
    Load,
    Set { key: String, value: String },
    Remove { key: String },
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrefsError {
    #[error("invalid preference key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("preference storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PrefsOutput {
    Snapshot(PrefsSnapshot),
    Written,
    Removed,
}

#[must_use = "preference results must be handled"]
pub type PrefsResult = Result<PrefsOutput, PrefsError>;

impl Operation for PrefsOperation {
    type Output = PrefsResult;
}

pub fn validate_key(key: &str) -> Result<(), PrefsError> {
    if key.trim().is_empty() {
        return Err(PrefsError::InvalidKey {
            key: key.to_string(),
            reason: "key cannot be empty".to_string(),
        });
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(PrefsError::InvalidKey {
            key: key.chars().take(32).collect(),
            reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
        });
    }
    if key.chars().any(char::is_control) {
        return Err(PrefsError::InvalidKey {
            key: key.to_string(),
            reason: "key contains control characters".to_string(),
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct Prefs<E> {
    context: CapabilityContext<PrefsOperation, E>,
}

impl<Ev> Capability<Ev> for Prefs<Ev> {
    type Operation = PrefsOperation;
    type MappedSelf<MappedEv> = Prefs<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Prefs::new(self.context.map_event(f))
    }
}

impl<E> Prefs<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<PrefsOperation, E>) -> Self {
        Self { context }
    }

    pub fn load<F>(&self, callback: F)
    where
        F: Fn(PrefsResult) -> E + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx.request_from_shell(PrefsOperation::Load).await;
            ctx.update_app(callback(output));
        });
    }

    pub fn set<F>(&self, key: &str, value: &str, callback: F)
    where
        F: Fn(PrefsResult) -> E + Send + Sync + 'static,
    {
        if let Err(e) = validate_key(key) {
            let _ = callback;
            debug_assert!(false, "invalid preference key: {e}");
            return;
        }
        let ctx = self.context.clone();
        let operation = PrefsOperation::Set {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.context.spawn(async move {
            let output = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(output));
        });
    }

    pub fn remove<F>(&self, key: &str, callback: F)
    where
        F: Fn(PrefsResult) -> E + Send + Sync + 'static,
    {
        if let Err(e) = validate_key(key) {
            let _ = callback;
            debug_assert!(false, "invalid preference key: {e}");
            return;
        }
        let ctx = self.context.clone();
        let operation = PrefsOperation::Remove {
            key: key.to_string(),
        };
        self.context.spawn(async move {
            let output = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(output));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_flag_semantics() {
        let snapshot = PrefsSnapshot::new()
            .with(keys::LANGUAGE_SELECTED, "true")
            .with(keys::THEME_SELECTED, "yes")
            .with(keys::LANGUAGE, "hi");

        assert!(snapshot.flag(keys::LANGUAGE_SELECTED));
        assert!(!snapshot.flag(keys::THEME_SELECTED));
        assert!(!snapshot.flag(keys::ONBOARDING_COMPLETED));
        assert_eq!(snapshot.get(keys::LANGUAGE), Some("hi"));
        assert_eq!(snapshot.get(keys::CURRENT_USER), None);
    }

    #[test]
    fn test_key_validation() {
        assert!(validate_key(keys::CURRENT_USER).is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("   ").is_err());
        assert!(validate_key("bad\nkey").is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_all_known_keys_are_valid() {
        for key in keys::ALL {
            assert!(validate_key(key).is_ok(), "key {key} failed validation");
        }
    }

    #[test]
    fn test_operation_serialization() {
        let op = PrefsOperation::Set {
            key: keys::VIEW_TYPE.into(),
            value: "admin".into(),
        };
        let json = serde_json::to_string(&op).unwrap();
        let parsed: PrefsOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, parsed);
    }
}
