//! Error handling for package building
//!
//! Two families of errors exist. [`ConfigError`] describes a configuration
//! value that fails a security or domain constraint and is reported to the
//! host as a structured field/message pair. [`BuildError`] describes an
//! operational failure while building and is reported through the error
//! field of an execution result.

use crate::security::command_executor::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// A configuration value rejected by validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("absolute paths are not allowed: {path}")]
    AbsolutePath { path: String },

    #[error("path traversal detected: cannot use '..' to escape working directory")]
    PathTraversal { path: String },

    #[error("format cannot be empty")]
    EmptyFormat,

    #[error("invalid format name: must contain only lowercase letters")]
    InvalidFormatName { format: String },

    #[error("unsupported format: {format} (allowed: {allowed})")]
    UnsupportedFormat { format: String, allowed: String },

    #[error("unsupported architecture: {arch} (allowed: {allowed})")]
    UnsupportedArchitecture { arch: String, allowed: String },

    #[error("packager must be 'nfpm' or 'native'")]
    InvalidPackager { packager: String },
}

impl ConfigError {
    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::AbsolutePath { .. } => "ABSOLUTE_PATH",
            Self::PathTraversal { .. } => "PATH_TRAVERSAL",
            Self::EmptyFormat => "EMPTY_FORMAT",
            Self::InvalidFormatName { .. } => "INVALID_FORMAT_NAME",
            Self::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Self::UnsupportedArchitecture { .. } => "UNSUPPORTED_ARCHITECTURE",
            Self::InvalidPackager { .. } => "INVALID_PACKAGER",
        }
    }
}

/// Operational failure while building packages
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("config file does not exist: {0}")]
    ConfigNotFound(String),

    #[error("config path is a directory, not a file: {0}")]
    ConfigIsDirectory(String),

    #[error("failed to stat config file: {0}")]
    ConfigUnreadable(#[source] std::io::Error),

    #[error("failed to create output directory: {source}")]
    OutputDirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare command executor: {0}")]
    ExecutorUnavailable(#[source] CommandError),

    #[error("failed to build {format} package: {source}\nOutput: {output}")]
    PackagingFailed {
        format: String,
        output: String,
        #[source]
        source: CommandError,
    },
}

impl BuildError {
    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ConfigNotFound(_) => vec![
                "Check the config_path setting",
                "Create an nfpm.yaml in the project root",
            ],
            Self::ConfigIsDirectory(_) => {
                vec!["Point config_path at the nfpm configuration file, not its directory"]
            }
            Self::ConfigUnreadable(_) => vec!["Check file permissions on the config file"],
            Self::OutputDirCreation { .. } => vec![
                "Check permissions on the output_dir parent",
                "Make sure output_dir is not an existing file",
            ],
            Self::ExecutorUnavailable(_) => vec!["Check the plugin working directory"],
            Self::PackagingFailed { source, .. } => match source {
                CommandError::ExecutionFailed(_) => {
                    vec!["Install nfpm and make sure it is on PATH"]
                }
                CommandError::Timeout(_) => vec!["Increase the build timeout"],
                _ => vec![
                    "Review the nfpm output above",
                    "Run `nfpm package` locally with the same config",
                ],
            },
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigIsDirectory(_) => "CONFIG_IS_DIRECTORY",
            Self::ConfigUnreadable(_) => "CONFIG_UNREADABLE",
            Self::OutputDirCreation { .. } => "OUTPUT_DIR_CREATION_FAILED",
            Self::ExecutorUnavailable(_) => "EXECUTOR_UNAVAILABLE",
            Self::PackagingFailed { .. } => "PACKAGING_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_absolute_path_message() {
        let error = ConfigError::AbsolutePath {
            path: "/etc/nfpm.yaml".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "absolute paths are not allowed: /etc/nfpm.yaml"
        );
        assert_eq!(error.code(), "ABSOLUTE_PATH");
    }

    #[test]
    fn test_path_traversal_message() {
        let error = ConfigError::PathTraversal {
            path: "../secret".to_string(),
        };

        assert!(error.to_string().contains("path traversal detected"));
        assert_eq!(error.code(), "PATH_TRAVERSAL");
    }

    #[test]
    fn test_unsupported_format_lists_allowed() {
        let error = ConfigError::UnsupportedFormat {
            format: "msi".to_string(),
            allowed: "deb, rpm, apk".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "unsupported format: msi (allowed: deb, rpm, apk)"
        );
    }

    #[test]
    fn test_config_not_found() {
        let error = BuildError::ConfigNotFound("nfpm.yaml".to_string());

        assert_eq!(error.to_string(), "config file does not exist: nfpm.yaml");
        assert_eq!(error.code(), "CONFIG_NOT_FOUND");
        assert!(!error.suggested_actions().is_empty());
    }

    #[test]
    fn test_packaging_failed_includes_format_and_output() {
        let error = BuildError::PackagingFailed {
            format: "rpm".to_string(),
            output: "rpmbuild: missing spec".to_string(),
            source: CommandError::NonZeroExit {
                program: "nfpm".to_string(),
                code: Some(1),
                output: "rpmbuild: missing spec".to_string(),
            },
        };

        let message = error.to_string();
        assert!(message.starts_with("failed to build rpm package:"));
        assert!(message.contains("\nOutput: rpmbuild: missing spec"));
        assert_eq!(error.code(), "PACKAGING_FAILED");
    }

    #[test]
    fn test_timeout_suggests_longer_timeout() {
        let error = BuildError::PackagingFailed {
            format: "deb".to_string(),
            output: String::new(),
            source: CommandError::Timeout(Duration::from_secs(5)),
        };

        assert_eq!(error.suggested_actions(), vec!["Increase the build timeout"]);
    }
}
