//! Template limits and defaults.
//!
//! The name-length bound comes from the key's OATH applet, which stores the
//! credential name (`issuer:account`) in a fixed 64-byte field. It is kept
//! configurable so other storage back-ends can tighten or relax it.

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`TemplateConfig::max_name_length`].
pub const MAX_NAME_LENGTH_ENV: &str = "SORNG_OATH_MAX_NAME_LENGTH";

/// Maximum stored name length on a YubiKey OATH applet, in bytes.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 64;

pub const DEFAULT_DIGITS: u8 = 6;
pub const DEFAULT_PERIOD: u32 = 30;
pub const DEFAULT_COUNTER: u32 = 0;

/// Limits applied while building a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Upper bound, in UTF-8 bytes, for `issuer:account` (or `account`
    /// alone when there is no issuer).
    pub max_name_length: usize,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl TemplateConfig {
    pub fn new(max_name_length: usize) -> Self {
        Self { max_name_length }
    }

    /// Defaults, overridden by `SORNG_OATH_MAX_NAME_LENGTH` when it holds a
    /// positive integer.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_NAME_LENGTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_name_length = n,
                _ => log::warn!(
                    "ignoring {}={:?}: expected a positive integer",
                    MAX_NAME_LENGTH_ENV,
                    raw
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_device_limit() {
        assert_eq!(TemplateConfig::default().max_name_length, 64);
    }

    #[test]
    fn lookup_override() {
        let config = TemplateConfig::from_lookup(|k| {
            (k == MAX_NAME_LENGTH_ENV).then(|| "32".to_string())
        });
        assert_eq!(config.max_name_length, 32);
    }

    #[test]
    fn lookup_rejects_garbage() {
        let zero = TemplateConfig::from_lookup(|_| Some("0".into()));
        assert_eq!(zero, TemplateConfig::default());
        let text = TemplateConfig::from_lookup(|_| Some("lots".into()));
        assert_eq!(text, TemplateConfig::default());
        let unset = TemplateConfig::from_lookup(|_| None);
        assert_eq!(unset, TemplateConfig::default());
    }

    #[test]
    fn serde_fills_missing_fields() {
        let config: TemplateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TemplateConfig::default());
        let config: TemplateConfig = serde_json::from_str(r#"{"max_name_length":20}"#).unwrap();
        assert_eq!(config.max_name_length, 20);
    }
}
