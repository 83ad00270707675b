//! Config Validator - Security and domain checks for the plugin configuration
//!
//! Every rule is independent. [`ConfigValidator::validate`] reports every
//! violation it finds, while [`ConfigValidator::first_violation`] is used by
//! the build path, which stops at the first one.
//!
//! # Example
//!
//! ```
//! use linuxpkg::validation::ConfigValidator;
//! use linuxpkg::RawConfig;
//!
//! let mut raw = RawConfig::new();
//! raw.insert("formats".to_string(), serde_json::json!(["deb", "msi"]));
//!
//! let result = ConfigValidator::validate(&raw);
//! assert!(!result.valid);
//! assert_eq!(result.errors[0].field, "formats");
//! ```

use crate::core::config::PackageConfig;
use crate::core::error::ConfigError;
use crate::core::traits::{RawConfig, ValidationError, ValidationResult};
use crate::security::path_guard::validate_path;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

/// Package formats nfpm can build
pub const ALLOWED_FORMATS: &[&str] = &["deb", "rpm", "apk"];

/// Packaging strategies
pub const ALLOWED_PACKAGERS: &[&str] = &["nfpm", "native"];

lazy_static! {
    /// Target architectures, in nfpm/GOARCH naming
    pub static ref ALLOWED_ARCHITECTURES: BTreeSet<&'static str> =
        ["amd64", "386", "arm64", "arm", "ppc64le", "s390x", "riscv64"]
            .into_iter()
            .collect();

    static ref FORMAT_NAME_PATTERN: Regex = Regex::new(r"^[a-z]+$").unwrap();
}

/// Target values that mean "build for the machine running the plugin"
const NATIVE_TARGETS: &[&str] = &["", "current"];

/// Validate that a package format is allowed
pub fn validate_format(format: &str) -> Result<(), ConfigError> {
    if format.is_empty() {
        return Err(ConfigError::EmptyFormat);
    }

    if !FORMAT_NAME_PATTERN.is_match(format) {
        return Err(ConfigError::InvalidFormatName {
            format: format.to_string(),
        });
    }

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ConfigError::UnsupportedFormat {
            format: format.to_string(),
            allowed: ALLOWED_FORMATS.join(", "),
        });
    }

    Ok(())
}

/// Validate that a target architecture is allowed
pub fn validate_architecture(arch: &str) -> Result<(), ConfigError> {
    if NATIVE_TARGETS.contains(&arch) || ALLOWED_ARCHITECTURES.contains(arch) {
        return Ok(());
    }

    Err(ConfigError::UnsupportedArchitecture {
        arch: arch.to_string(),
        allowed: ALLOWED_ARCHITECTURES
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .join(", "),
    })
}

pub fn validate_packager(packager: &str) -> Result<(), ConfigError> {
    if ALLOWED_PACKAGERS.contains(&packager) {
        Ok(())
    } else {
        Err(ConfigError::InvalidPackager {
            packager: packager.to_string(),
        })
    }
}

/// Validator for the plugin configuration
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a raw configuration map, collecting every violation.
    ///
    /// An empty `formats` list is accepted; execution substitutes the defaults.
    pub fn validate(raw: &RawConfig) -> ValidationResult {
        let config = PackageConfig::from_raw_unchecked(raw);

        let errors: Vec<ValidationError> = Self::violations(&config)
            .into_iter()
            .map(|(field, error)| ValidationError {
                field: field.to_string(),
                message: error.to_string(),
                severity: "error".to_string(),
            })
            .collect();

        ValidationResult {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// First violation in field order, labelled for an execution error message
    /// (`format` rather than `formats`).
    pub fn first_violation(config: &PackageConfig) -> Option<(&'static str, ConfigError)> {
        Self::violations(config)
            .into_iter()
            .next()
            .map(|(field, error)| match field {
                "formats" => ("format", error),
                other => (other, error),
            })
    }

    fn violations(config: &PackageConfig) -> Vec<(&'static str, ConfigError)> {
        let mut found = Vec::new();

        if let Err(e) = validate_path(&config.config_path) {
            found.push(("config_path", e));
        }
        if let Err(e) = validate_path(&config.output_dir) {
            found.push(("output_dir", e));
        }
        for format in &config.formats {
            if let Err(e) = validate_format(format) {
                found.push(("formats", e));
            }
        }
        if let Err(e) = validate_architecture(&config.target) {
            found.push(("target", e));
        }
        if let Err(e) = validate_packager(&config.packager) {
            found.push(("packager", e));
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn raw(value: Value) -> RawConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_config_is_valid() {
        let result = ConfigValidator::validate(&RawConfig::new());
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_full_valid_configuration() {
        let result = ConfigValidator::validate(&raw(json!({
            "config_path": "packaging/nfpm.yaml",
            "formats": ["deb", "rpm", "apk"],
            "output_dir": "build/packages",
            "packager": "native",
            "target": "riscv64",
        })));
        assert!(result.valid, "unexpected errors: {:?}", result.errors);
    }

    #[test]
    fn test_empty_formats_list_is_valid() {
        let result = ConfigValidator::validate(&raw(json!({ "formats": [] })));
        assert!(result.valid);
    }

    #[test]
    fn test_validate_format() {
        for format in ["deb", "rpm", "apk"] {
            assert!(validate_format(format).is_ok());
        }
        assert_eq!(validate_format(""), Err(ConfigError::EmptyFormat));
        assert!(matches!(
            validate_format("DEB"),
            Err(ConfigError::InvalidFormatName { .. })
        ));
        assert!(matches!(
            validate_format("deb;rm"),
            Err(ConfigError::InvalidFormatName { .. })
        ));
        assert!(matches!(
            validate_format("msi"),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_validate_architecture() {
        for arch in ["", "current", "amd64", "386", "arm64", "arm", "ppc64le", "s390x", "riscv64"] {
            assert!(validate_architecture(arch).is_ok(), "{} should be allowed", arch);
        }

        let err = validate_architecture("x86_64").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported architecture: x86_64 (allowed: 386, amd64, arm, arm64, ppc64le, riscv64, s390x)"
        );
    }

    #[test]
    fn test_validate_packager() {
        assert!(validate_packager("nfpm").is_ok());
        assert!(validate_packager("native").is_ok());
        assert!(validate_packager("fpm").is_err());
        assert!(validate_packager("").is_err());
    }

    #[test]
    fn test_collects_every_violation() {
        let result = ConfigValidator::validate(&raw(json!({
            "config_path": "../nfpm.yaml",
            "output_dir": "/var/tmp",
            "formats": ["deb", "MSI", "exe"],
            "target": "sparc",
            "packager": "fpm",
        })));

        assert!(!result.valid);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["config_path", "output_dir", "formats", "formats", "target", "packager"]
        );
        assert!(result.errors[0].message.contains("path traversal detected"));
        assert!(result.errors[1].message.contains("absolute paths are not allowed"));
        assert!(result.errors[2].message.contains("invalid format name"));
        assert!(result.errors[3].message.contains("unsupported format: exe"));
        assert_eq!(result.errors[5].message, "packager must be 'nfpm' or 'native'");
        assert!(result.errors.iter().all(|e| e.severity == "error"));
    }

    #[test]
    fn test_first_violation_is_in_field_order() {
        let config = PackageConfig {
            formats: vec!["deb".to_string(), "zip".to_string()],
            target: "sparc".to_string(),
            ..PackageConfig::default()
        };

        let (field, error) = ConfigValidator::first_violation(&config).unwrap();
        assert_eq!(field, "format");
        assert!(matches!(error, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_first_violation_matches_collected_errors() {
        let cases = [
            (json!({"config_path": "/etc/nfpm.yaml", "packager": "fpm"}), "config_path"),
            (json!({"output_dir": "../out", "target": "mips"}), "output_dir"),
            (json!({"formats": ["Deb"], "packager": "fpm"}), "format"),
            (json!({"target": "mips", "packager": "fpm"}), "target"),
            (json!({"packager": "fpm"}), "packager"),
        ];

        for (value, expected) in cases {
            let raw_config = raw(value);
            let collected = ConfigValidator::validate(&raw_config);
            let config = PackageConfig::from_raw_unchecked(&raw_config);
            let (field, error) = ConfigValidator::first_violation(&config).unwrap();

            assert_eq!(field, expected);
            assert_eq!(collected.errors[0].message, error.to_string());
        }
    }

    #[test]
    fn test_first_violation_none_for_defaults() {
        assert!(ConfigValidator::first_violation(&PackageConfig::default()).is_none());
    }
}
