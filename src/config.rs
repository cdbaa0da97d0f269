//! Configuration management for the review annotator

use serde::Deserialize;
use std::env;
use tracing::warn;

use crate::annotations::MergePolicy;
use crate::error::ConfigError;
use crate::html::HighlightConfig;

const DEFAULT_DATABASE_URL: &str = "sqlite:./review_system.db";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub annotation: AnnotationConfig,
    pub highlight: HighlightConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AnnotationConfig {
    pub merge_policy: MergePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
            },
            annotation: AnnotationConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the environment
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("Failed to read .env file: {}", e);
            }
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = HighlightConfig::default();

        let merge_policy = match lookup("MERGE_POLICY") {
            Some(value) => value.parse()?,
            None => MergePolicy::default(),
        };

        let include_inline_styles = match lookup("HIGHLIGHT_INLINE_STYLES") {
            Some(value) => parse_flag("HIGHLIGHT_INLINE_STYLES", &value)?,
            None => defaults.include_inline_styles,
        };

        Ok(Config {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
            annotation: AnnotationConfig { merge_policy },
            highlight: HighlightConfig {
                class_prefix: lookup("HIGHLIGHT_CLASS_PREFIX").unwrap_or(defaults.class_prefix),
                include_inline_styles,
                ..defaults
            },
        })
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database.url, "sqlite:./review_system.db");
        assert_eq!(config.annotation.merge_policy, MergePolicy::Merge);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("MERGE_POLICY", "append"),
            ("HIGHLIGHT_CLASS_PREFIX", "hl"),
            ("HIGHLIGHT_INLINE_STYLES", "off"),
        ]))
        .unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.annotation.merge_policy, MergePolicy::Append);
        assert_eq!(config.highlight.class_prefix, "hl");
        assert!(!config.highlight.include_inline_styles);
        assert_eq!(config.highlight.category_attribute, "data-error-type");
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup_from(&[("MERGE_POLICY", "sometimes")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "MERGE_POLICY", .. }));

        let err = Config::from_lookup(lookup_from(&[("HIGHLIGHT_INLINE_STYLES", "maybe")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "HIGHLIGHT_INLINE_STYLES",
                value: "maybe".to_string()
            }
        );
    }
}
