//! Locale maps for command names and descriptions.

use std::collections::BTreeMap;

use crate::error::ValidationError;

/// Key under which the fallback value is stored.
pub const DEFAULT_LOCALE: &str = "default";

/// Map from locale tag to string, always holding a `"default"` entry.
///
/// The default is sent to the platform as the top-level `name` or
/// `description`; every other entry becomes a localization override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedString {
    entries: BTreeMap<String, String>,
}

impl LocalizedString {
    pub fn new(default: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(DEFAULT_LOCALE.to_string(), default.into());
        Self { entries }
    }

    /// Builds a map from raw entries, which must include `"default"`.
    pub fn from_map<K, V>(map: impl IntoIterator<Item = (K, V)>) -> Result<Self, ValidationError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries: BTreeMap<String, String> = map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if !entries.contains_key(DEFAULT_LOCALE) {
            return Err(ValidationError::MissingDefault {
                locales: entries.keys().cloned().collect(),
            });
        }

        Ok(Self { entries })
    }

    /// Adds or replaces the value for `locale`.
    pub fn with(mut self, locale: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(locale.into(), value.into());
        self
    }

    pub fn default_value(&self) -> &str {
        self.entries
            .get(DEFAULT_LOCALE)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn set_default(&mut self, value: impl Into<String>) {
        self.entries.insert(DEFAULT_LOCALE.to_string(), value.into());
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.entries.get(locale).map(String::as_str)
    }

    /// Number of entries, the default included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Non-default overrides, or `None` when only the default is set.
    pub fn localizations(&self) -> Option<BTreeMap<String, String>> {
        if self.entries.len() <= 1 {
            return None;
        }

        Some(
            self.entries
                .iter()
                .filter(|(locale, _)| locale.as_str() != DEFAULT_LOCALE)
                .map(|(locale, value)| (locale.clone(), value.clone()))
                .collect(),
        )
    }

    /// Rebuilds a map from a wire pair of default value and overrides.
    pub fn from_wire(default: impl Into<String>, overrides: Option<&BTreeMap<String, String>>) -> Self {
        let mut localized = Self::new(default);
        if let Some(overrides) = overrides {
            for (locale, value) in overrides {
                if locale != DEFAULT_LOCALE {
                    localized.entries.insert(locale.clone(), value.clone());
                }
            }
        }
        localized
    }
}

impl From<&str> for LocalizedString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LocalizedString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for LocalizedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_value())
    }
}
