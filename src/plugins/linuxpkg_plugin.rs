//! LinuxPkg Plugin - Builds deb/rpm/apk packages after a release is published
//!
//! The plugin only reacts to the post-publish hook. Every other hook is
//! acknowledged as a successful no-op.

use crate::core::config::PackageConfig;
use crate::core::traits::{
    ExecuteRequest, ExecutionResult, Hook, Plugin, PluginInfo, RawConfig, ValidationResult,
};
use crate::orchestration::PackageBuilder;
use crate::security::CommandExecutor;
use crate::validation::ConfigValidator;
use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const PLUGIN_NAME: &str = "linuxpkg";

/// Linux package building plugin
pub struct LinuxPkgPlugin {
    working_dir: PathBuf,
    /// Falls back to a SafeCommandExecutor rooted at `working_dir` when unset
    executor: Option<Arc<dyn CommandExecutor>>,
    timeout: Option<Duration>,
}

impl Default for LinuxPkgPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxPkgPlugin {
    /// Create a plugin that runs nfpm from the current directory
    pub fn new() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            executor: None,
            timeout: None,
        }
    }

    /// Resolve configured paths against `working_dir` and run nfpm there
    pub fn with_working_dir<P: AsRef<Path>>(mut self, working_dir: P) -> Self {
        self.working_dir = working_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Limit each nfpm invocation (default executor only)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn builder(&self) -> PackageBuilder {
        let mut builder = PackageBuilder::new(&self.working_dir);
        if let Some(executor) = &self.executor {
            builder = builder.with_executor(Arc::clone(executor));
        }
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        builder
    }
}

fn config_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "config_path": {
                "type": "string",
                "description": "Path to nfpm.yaml config file",
                "default": "nfpm.yaml"
            },
            "formats": {
                "type": "array",
                "items": {"type": "string", "enum": ["deb", "rpm", "apk"]},
                "description": "Package formats to build",
                "default": ["deb", "rpm"]
            },
            "output_dir": {
                "type": "string",
                "description": "Output directory for packages",
                "default": "dist"
            },
            "packager": {
                "type": "string",
                "enum": ["nfpm", "native"],
                "description": "Tool to use for packaging",
                "default": "nfpm"
            },
            "target": {
                "type": "string",
                "description": "Target architecture",
                "default": "current"
            }
        }
    })
}

#[async_trait]
impl Plugin for LinuxPkgPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Build deb/rpm packages for Linux".to_string(),
            author: "Relicta Team".to_string(),
            hooks: vec![Hook::PostPublish],
            config_schema: config_schema(),
        }
    }

    async fn validate(&self, config: &RawConfig) -> anyhow::Result<ValidationResult> {
        Ok(ConfigValidator::validate(config))
    }

    async fn execute(&self, request: ExecuteRequest) -> anyhow::Result<ExecutionResult> {
        let config = PackageConfig::from_raw(&request.config);

        match request.hook {
            Hook::PostPublish => Ok(self
                .builder()
                .build_packages(&config, &request.context, request.dry_run)
                .await),
            hook => {
                debug!(hook = %hook, "Ignoring hook");
                Ok(ExecutionResult::success(format!("Hook {} not handled", hook)))
            }
        }
    }
}
