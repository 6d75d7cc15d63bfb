//! Patch source configuration and URL templates

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_LISTING_URL, DEFAULT_PATCH_SUFFIX, DEFAULT_RAW_URL,
    DEFAULT_REFERENCE, DEFAULT_SOURCES,
};
use portpatch_errors::{ConfigError, Error};
use portpatch_types::is_plain_name;
use serde::{Deserialize, Serialize};

/// Where patches come from and how to find them
///
/// URL templates accept `{source}` and `{reference}`; `raw_url` also accepts
/// `{file}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Source identifiers in priority order
    #[serde(default = "default_names")]
    pub names: Vec<String>,
    #[serde(default = "default_reference")]
    pub reference: String,
    /// HTML directory listing scraped for `href` tokens
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    /// Structured contents API returning a JSON array of entries
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Raw file download location
    #[serde(default = "default_raw_url")]
    pub raw_url: String,
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,
    /// Bearer token sent to the contents API only
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            names: default_names(),
            reference: default_reference(),
            listing_url: default_listing_url(),
            api_url: default_api_url(),
            raw_url: default_raw_url(),
            suffixes: default_suffixes(),
            api_token: None,
        }
    }
}

impl SourcesConfig {
    /// Check that every template carries the placeholders it needs
    ///
    /// # Errors
    ///
    /// Returns an error if a template lacks `{source}`, if `raw_url` lacks
    /// `{file}`, if a source name is not a single path component, or if the
    /// suffix list is empty or holds a blank entry.
    pub fn validate(&self) -> Result<(), Error> {
        for (field, template) in [
            ("sources.listing_url", &self.listing_url),
            ("sources.api_url", &self.api_url),
            ("sources.raw_url", &self.raw_url),
        ] {
            if !template.contains("{source}") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: template.clone(),
                }
                .into());
            }
        }
        if !self.raw_url.contains("{file}") {
            return Err(ConfigError::InvalidValue {
                field: "sources.raw_url".to_string(),
                value: self.raw_url.clone(),
            }
            .into());
        }
        if self.suffixes.is_empty() {
            return Err(ConfigError::MissingField {
                field: "sources.suffixes".to_string(),
            }
            .into());
        }
        if let Some(blank) = self.suffixes.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "sources.suffixes".to_string(),
                value: blank.clone(),
            }
            .into());
        }
        if let Some(name) = self.names.iter().find(|name| !is_plain_name(name)) {
            return Err(ConfigError::InvalidValue {
                field: "sources.names".to_string(),
                value: name.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Fill `{source}`, `{reference}` and `{file}` placeholders
#[must_use]
pub fn expand_template(template: &str, source: &str, reference: &str, file: Option<&str>) -> String {
    let expanded = template
        .replace("{source}", source)
        .replace("{reference}", reference);
    match file {
        Some(file) => expanded.replace("{file}", file),
        None => expanded,
    }
}

fn default_names() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(ToString::to_string).collect()
}

fn default_reference() -> String {
    DEFAULT_REFERENCE.to_string()
}

fn default_listing_url() -> String {
    DEFAULT_LISTING_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_raw_url() -> String {
    DEFAULT_RAW_URL.to_string()
}

fn default_suffixes() -> Vec<String> {
    vec![DEFAULT_PATCH_SUFFIX.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_template() {
        let url = expand_template(
            "https://host/{reference}/packages/{source}/{file}",
            "nodejs-lts",
            "v1",
            Some("a.patch"),
        );
        assert_eq!(url, "https://host/v1/packages/nodejs-lts/a.patch");
    }

    #[test]
    fn test_defaults_validate() {
        assert!(SourcesConfig::default().validate().is_ok());
    }

    #[test]
    fn test_raw_template_needs_file() {
        let config = SourcesConfig {
            raw_url: "https://host/{source}".into(),
            ..SourcesConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_suffix_is_rejected() {
        let config = SourcesConfig {
            suffixes: vec![".patch".into(), String::new()],
            ..SourcesConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SourcesConfig {
            suffixes: Vec::new(),
            ..SourcesConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_names_must_be_plain() {
        let config = SourcesConfig {
            names: vec!["nodejs".into(), "../etc".into()],
            ..SourcesConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
