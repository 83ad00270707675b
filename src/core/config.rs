//! Plugin configuration parsed from the host-supplied map
//!
//! Every field has a default, so an empty or partial map always parses.

use super::traits::RawConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CONFIG_PATH: &str = "nfpm.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = "dist";
pub const DEFAULT_PACKAGER: &str = "nfpm";
pub const DEFAULT_TARGET: &str = "current";
pub const DEFAULT_FORMATS: &[&str] = &["deb", "rpm"];

/// Resolved plugin configuration for a single execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Path to the nfpm configuration file
    pub config_path: String,
    /// Package formats to build, in build order
    pub formats: Vec<String>,
    /// Directory packages are written to
    pub output_dir: String,
    /// Packaging strategy (nfpm or native)
    pub packager: String,
    /// Target architecture, or "current"
    pub target: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            formats: default_formats(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            packager: DEFAULT_PACKAGER.to_string(),
            target: DEFAULT_TARGET.to_string(),
        }
    }
}

impl PackageConfig {
    /// Parse a raw configuration map for execution.
    ///
    /// An explicitly empty `formats` list falls back to the default formats.
    pub fn from_raw(raw: &RawConfig) -> Self {
        let mut config = Self::from_raw_unchecked(raw);
        if config.formats.is_empty() {
            config.formats = default_formats();
        }
        config
    }

    /// Parse a raw configuration map, keeping `formats` exactly as supplied.
    pub(crate) fn from_raw_unchecked(raw: &RawConfig) -> Self {
        Self {
            config_path: get_string(raw, "config_path", DEFAULT_CONFIG_PATH),
            formats: get_string_list(raw, "formats").unwrap_or_else(default_formats),
            output_dir: get_string(raw, "output_dir", DEFAULT_OUTPUT_DIR),
            packager: get_string(raw, "packager", DEFAULT_PACKAGER),
            target: get_string(raw, "target", DEFAULT_TARGET),
        }
    }
}

fn default_formats() -> Vec<String> {
    DEFAULT_FORMATS.iter().map(|f| f.to_string()).collect()
}

fn get_string(raw: &RawConfig, key: &str, default: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => default.to_string(),
    }
}

/// Read a list of strings. Non-string scalars are kept as their JSON text
/// so that validation rejects them instead of silently dropping them.
fn get_string_list(raw: &RawConfig, key: &str) -> Option<Vec<String>> {
    match raw.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::String(s) => Some(vec![s.clone()]),
        _ => None,
    }
}
