//! Package Builder - Drives nfpm once per requested format
//!
//! Manages the post-publish build workflow:
//! - Re-validation of the configuration (fail fast)
//! - Target architecture resolution
//! - Dry-run reporting without side effects
//! - Config file and output directory checks
//! - Sequential nfpm invocations and artifact path discovery

use crate::core::config::PackageConfig;
use crate::core::error::BuildError;
use crate::core::traits::{ExecutionResult, ReleaseContext};
use crate::security::command_executor::{CommandExecutor, SafeCommandExecutor};
use crate::validation::ConfigValidator;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// External packaging tool invoked for every format
pub const PACKAGING_TOOL: &str = "nfpm";

const CREATED_PACKAGE_PREFIX: &str = "created package:";

/// Orchestrates package builds for a single configuration
pub struct PackageBuilder {
    working_dir: PathBuf,
    executor: Option<Arc<dyn CommandExecutor>>,
    timeout: Option<Duration>,
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

impl PackageBuilder {
    /// Create a builder that resolves relative paths against `working_dir`
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            executor: None,
            timeout: None,
        }
    }

    /// Use a specific command executor instead of spawning real processes
    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Timeout applied to each nfpm invocation by the default executor
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build every requested package, or describe what would be built.
    ///
    /// Never returns a fault: every failure is folded into a failed result.
    pub async fn build_packages(
        &self,
        config: &PackageConfig,
        context: &ReleaseContext,
        dry_run: bool,
    ) -> ExecutionResult {
        if let Some((field, error)) = ConfigValidator::first_violation(config) {
            warn!(field = field, code = error.code(), "Rejected configuration: {}", error);
            return ExecutionResult::failure(format!("invalid {}: {}", field, error));
        }

        let target = resolve_target(&config.target);

        if dry_run {
            info!(
                formats = ?config.formats,
                target = %target,
                "Dry run, no packages will be built"
            );
            return ExecutionResult::success(format!(
                "Would build {} package(s) using {}",
                config.formats.len(),
                config.packager
            ))
            .with_output("config_path", config.config_path.clone())
            .with_output("formats", config.formats.clone())
            .with_output("output_dir", config.output_dir.clone())
            .with_output("packager", config.packager.clone())
            .with_output("target", target)
            .with_output("version", context.version.clone());
        }

        match self.run_builds(config).await {
            Ok(packages) => {
                info!(count = packages.len(), "Linux packages built");
                ExecutionResult::success(format!("Built {} Linux package(s)", packages.len()))
                    .with_output("packages", packages)
                    .with_output("formats", config.formats.clone())
                    .with_output("output_dir", config.output_dir.clone())
                    .with_output("target", target)
                    .with_output("version", context.version.clone())
            }
            Err(error) => {
                warn!(code = error.code(), "Package build failed: {}", error);
                ExecutionResult::failure(error.to_string())
                    .with_output("error_code", error.code())
                    .with_output("suggested_actions", error.suggested_actions())
            }
        }
    }

    async fn run_builds(&self, config: &PackageConfig) -> Result<Vec<String>, BuildError> {
        self.ensure_config_file(&config.config_path).await?;

        let output_dir = self.working_dir.join(&config.output_dir);
        fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| BuildError::OutputDirCreation {
                path: output_dir.clone(),
                source,
            })?;

        let executor = self.executor()?;
        let mut packages = Vec::with_capacity(config.formats.len());

        for format in &config.formats {
            info!(format = %format, "Building package");
            let args = package_args(config, format);
            debug!(tool = PACKAGING_TOOL, args = ?args, "Invoking packaging tool");

            let output = executor
                .run(PACKAGING_TOOL, &args)
                .await
                .map_err(|source| BuildError::PackagingFailed {
                    format: format.clone(),
                    output: source.output().to_string(),
                    source,
                })?;
            debug!(format = %format, output = %output, "Packaging tool finished");

            let package = match parse_package_path(&output, &config.output_dir, format) {
                Some(path) => path,
                None => {
                    let fallback = fallback_package_path(&config.output_dir, format);
                    warn!(
                        format = %format,
                        path = %fallback,
                        "No package path in nfpm output, using constructed path"
                    );
                    fallback
                }
            };
            info!(format = %format, package = %package, "Package created");
            packages.push(package);
        }

        Ok(packages)
    }

    async fn ensure_config_file(&self, config_path: &str) -> Result<(), BuildError> {
        match fs::metadata(self.working_dir.join(config_path)).await {
            Ok(metadata) if metadata.is_dir() => {
                Err(BuildError::ConfigIsDirectory(config_path.to_string()))
            }
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BuildError::ConfigNotFound(config_path.to_string()))
            }
            Err(e) => Err(BuildError::ConfigUnreadable(e)),
        }
    }

    fn executor(&self) -> Result<Arc<dyn CommandExecutor>, BuildError> {
        if let Some(executor) = &self.executor {
            return Ok(Arc::clone(executor));
        }

        let mut executor =
            SafeCommandExecutor::new(&self.working_dir).map_err(BuildError::ExecutorUnavailable)?;
        if let Some(timeout) = self.timeout {
            executor.set_timeout(timeout);
        }
        Ok(Arc::new(executor))
    }
}

/// Arguments for a single `nfpm package` invocation
pub fn package_args(config: &PackageConfig, format: &str) -> Vec<String> {
    vec![
        "package".to_string(),
        "--config".to_string(),
        config.config_path.clone(),
        "--packager".to_string(),
        format.to_string(),
        "--target".to_string(),
        format!("{}/", config.output_dir),
    ]
}

/// Resolve the configured target to an architecture name.
///
/// `""` and `"current"` mean the architecture of the running process.
pub fn resolve_target(target: &str) -> String {
    match target {
        "" | "current" => native_architecture().to_string(),
        other => other.to_string(),
    }
}

/// Architecture of the running process in nfpm/GOARCH naming
pub fn native_architecture() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "arm" => "arm",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "s390x" => "s390x",
        "riscv64" => "riscv64",
        other => other,
    }
}

/// Find the produced package path in nfpm output.
///
/// nfpm reports `created package: <path>`; some versions only print a line
/// mentioning the file, so a line holding both `.<format>` and the output
/// directory is accepted too.
pub fn parse_package_path(output: &str, output_dir: &str, format: &str) -> Option<String> {
    let extension = format!(".{}", format);

    output.lines().map(str::trim).find_map(|line| {
        if let Some(rest) = line.strip_prefix(CREATED_PACKAGE_PREFIX) {
            return Some(rest.trim().to_string());
        }
        if line.contains(&extension) && line.contains(output_dir) {
            return Some(line.to_string());
        }
        None
    })
}

/// Best-effort path used when nfpm output names no package
pub fn fallback_package_path(output_dir: &str, format: &str) -> String {
    Path::new(output_dir)
        .join(format!("package.{}", format))
        .to_string_lossy()
        .into_owned()
}
