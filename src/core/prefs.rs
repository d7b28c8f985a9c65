//! Host preference registration.
//!
//! The host registers typed preference keys with their defaults; a separate
//! store persists the values. Panels never read these directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod keys {
    /// AI provider configuration as JSON (`defaultProviderId` + `providers`)
    pub const PROVIDERS: &str = "browseros.providers";
    pub const SHOW_TOOLBAR_LABELS: &str = "browseros.show_toolbar_labels";
    /// Custom provider list as a JSON array
    pub const CUSTOM_PROVIDERS: &str = "browseros.custom_providers";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefType {
    String,
    Boolean,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Boolean(bool),
    String(String),
}

impl PrefValue {
    pub fn pref_type(&self) -> PrefType {
        match self {
            PrefValue::Boolean(_) => PrefType::Boolean,
            PrefValue::String(_) => PrefType::String,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefError {
    #[error("preference '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("preference '{0}' is not registered")]
    Unregistered(String),
    #[error("preference '{key}' expects a {expected:?} value")]
    TypeMismatch { key: String, expected: PrefType },
    #[error("preference '{key}' must hold JSON: {message}")]
    InvalidJson { key: String, message: String },
}

#[derive(Clone, Debug)]
struct PrefEntry {
    default: PrefValue,
    value: Option<PrefValue>,
    json: bool,
    settings_visible: bool,
}

impl PrefEntry {
    fn current(&self) -> &PrefValue {
        self.value.as_ref().unwrap_or(&self.default)
    }
}

/// Registry of typed preference keys
#[derive(Clone, Debug, Default)]
pub struct PrefRegistry {
    entries: BTreeMap<String, PrefEntry>,
}

impl PrefRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: &str, default: PrefValue, json: bool) -> Result<(), PrefError> {
        if self.entries.contains_key(key) {
            return Err(PrefError::AlreadyRegistered(key.to_string()));
        }
        self.entries.insert(
            key.to_string(),
            PrefEntry {
                default,
                value: None,
                json,
                settings_visible: false,
            },
        );
        Ok(())
    }

    pub fn register_string_pref(&mut self, key: &str, default: &str) -> Result<(), PrefError> {
        self.insert(key, PrefValue::String(default.to_string()), false)
    }

    /// Register a string preference whose non-empty values must parse as JSON
    pub fn register_json_pref(&mut self, key: &str, default: &str) -> Result<(), PrefError> {
        validate_json(key, default)?;
        self.insert(key, PrefValue::String(default.to_string()), true)
    }

    pub fn register_bool_pref(&mut self, key: &str, default: bool) -> Result<(), PrefError> {
        self.insert(key, PrefValue::Boolean(default), false)
    }

    /// Expose `key` to the settings UI
    pub fn allow_in_settings(&mut self, key: &str) -> Result<(), PrefError> {
        self.entry_mut(key)?.settings_visible = true;
        Ok(())
    }

    /// Settings-visible keys and their types
    pub fn allowlisted_keys(&self) -> Vec<(String, PrefType)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.settings_visible)
            .map(|(key, entry)| (key.clone(), entry.default.pref_type()))
            .collect()
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn entry(&self, key: &str) -> Result<&PrefEntry, PrefError> {
        self.entries
            .get(key)
            .ok_or_else(|| PrefError::Unregistered(key.to_string()))
    }

    fn entry_mut(&mut self, key: &str) -> Result<&mut PrefEntry, PrefError> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| PrefError::Unregistered(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Result<&PrefValue, PrefError> {
        Ok(self.entry(key)?.current())
    }

    pub fn get_string(&self, key: &str) -> Result<&str, PrefError> {
        match self.get(key)? {
            PrefValue::String(value) => Ok(value),
            PrefValue::Boolean(_) => Err(PrefError::TypeMismatch {
                key: key.to_string(),
                expected: PrefType::Boolean,
            }),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, PrefError> {
        match self.get(key)? {
            PrefValue::Boolean(value) => Ok(*value),
            PrefValue::String(_) => Err(PrefError::TypeMismatch {
                key: key.to_string(),
                expected: PrefType::String,
            }),
        }
    }

    /// Set `key`, checking the type and, for JSON prefs, the encoding
    pub fn set(&mut self, key: &str, value: PrefValue) -> Result<(), PrefError> {
        let entry = self.entry_mut(key)?;
        let expected = entry.default.pref_type();
        if value.pref_type() != expected {
            return Err(PrefError::TypeMismatch {
                key: key.to_string(),
                expected,
            });
        }
        if let (true, PrefValue::String(raw)) = (entry.json, &value) {
            validate_json(key, raw)?;
        }
        entry.value = Some(value);
        Ok(())
    }

    pub fn set_string(&mut self, key: &str, value: &str) -> Result<(), PrefError> {
        self.set(key, PrefValue::String(value.to_string()))
    }

    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PrefError> {
        self.set(key, PrefValue::Boolean(value))
    }

    pub fn reset(&mut self, key: &str) -> Result<(), PrefError> {
        self.entry_mut(key)?.value = None;
        Ok(())
    }

    pub fn is_default(&self, key: &str) -> Result<bool, PrefError> {
        Ok(self.entry(key)?.value.is_none())
    }

    /// Values that differ from their defaults, for the persistence layer
    pub fn user_values(&self) -> BTreeMap<String, PrefValue> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| entry.value.clone().map(|value| (key.clone(), value)))
            .collect()
    }

    /// Apply values read back from the persistence layer.
    /// Unknown keys and rejected values are logged and skipped.
    pub fn load_user_values(&mut self, values: BTreeMap<String, PrefValue>) {
        for (key, value) in values {
            if let Err(e) = self.set(&key, value) {
                log::warn!("[PrefRegistry] Ignoring stored preference: {}", e);
            }
        }
    }

    pub fn provider_settings(&self) -> Result<ProviderSettings, PrefError> {
        let raw = self.get_string(keys::PROVIDERS)?;
        ProviderSettings::from_json(raw).map_err(|e| PrefError::InvalidJson {
            key: keys::PROVIDERS.to_string(),
            message: e.to_string(),
        })
    }

    pub fn custom_providers(&self) -> Result<Vec<ProviderEntry>, PrefError> {
        let raw = self.get_string(keys::CUSTOM_PROVIDERS)?;
        custom_providers_from_json(raw).map_err(|e| PrefError::InvalidJson {
            key: keys::CUSTOM_PROVIDERS.to_string(),
            message: e.to_string(),
        })
    }

    pub fn show_toolbar_labels(&self) -> Result<bool, PrefError> {
        self.get_bool(keys::SHOW_TOOLBAR_LABELS)
    }
}

fn validate_json(key: &str, raw: &str) -> Result<(), PrefError> {
    if raw.trim().is_empty() {
        return Ok(());
    }
    serde_json::from_str::<serde_json::Value>(raw)
        .map(|_| ())
        .map_err(|e| PrefError::InvalidJson {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Register the browser-level preferences and expose them to settings
pub fn register_browser_prefs(registry: &mut PrefRegistry) -> Result<(), PrefError> {
    registry.register_json_pref(keys::PROVIDERS, "")?;
    registry.register_bool_pref(keys::SHOW_TOOLBAR_LABELS, true)?;
    registry.register_json_pref(keys::CUSTOM_PROVIDERS, "[]")?;

    for key in [keys::PROVIDERS, keys::SHOW_TOOLBAR_LABELS, keys::CUSTOM_PROVIDERS] {
        registry.allow_in_settings(key)?;
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(default)]
    pub default_provider_id: Option<String>,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

impl ProviderSettings {
    /// Decode the providers preference; an empty string means "not configured"
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    pub fn default_provider(&self) -> Option<&ProviderEntry> {
        let id = self.default_provider_id.as_deref()?;
        self.providers.iter().find(|provider| provider.id == id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Provider-specific fields kept as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub fn custom_providers_from_json(raw: &str) -> Result<Vec<ProviderEntry>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
}
