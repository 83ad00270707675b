//! Core traits and types for the host plugin contract
//!
//! This module defines the values exchanged with the release-automation
//! host: plugin metadata, lifecycle hooks, the release context, and the
//! results of validation and execution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Raw configuration map as supplied by the host
pub type RawConfig = HashMap<String, serde_json::Value>;

// ============================================================================
// Hooks
// ============================================================================

/// Lifecycle point in the host's release pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hook {
    PreInit,
    PostInit,
    PrePlan,
    PostPlan,
    PreVersion,
    PostVersion,
    PreNotes,
    PostNotes,
    PreApprove,
    PostApprove,
    PrePublish,
    PostPublish,
    OnSuccess,
    OnError,
}

impl Hook {
    pub const ALL: [Hook; 14] = [
        Hook::PreInit,
        Hook::PostInit,
        Hook::PrePlan,
        Hook::PostPlan,
        Hook::PreVersion,
        Hook::PostVersion,
        Hook::PreNotes,
        Hook::PostNotes,
        Hook::PreApprove,
        Hook::PostApprove,
        Hook::PrePublish,
        Hook::PostPublish,
        Hook::OnSuccess,
        Hook::OnError,
    ];

    /// Get string representation of the hook
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::PreInit => "pre-init",
            Hook::PostInit => "post-init",
            Hook::PrePlan => "pre-plan",
            Hook::PostPlan => "post-plan",
            Hook::PreVersion => "pre-version",
            Hook::PostVersion => "post-version",
            Hook::PreNotes => "pre-notes",
            Hook::PostNotes => "post-notes",
            Hook::PreApprove => "pre-approve",
            Hook::PostApprove => "post-approve",
            Hook::PrePublish => "pre-publish",
            Hook::PostPublish => "post-publish",
            Hook::OnSuccess => "on-success",
            Hook::OnError => "on-error",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Hook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| format!("unknown hook: {}", s))
    }
}

// ============================================================================
// Plugin metadata
// ============================================================================

/// Metadata a plugin declares to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub hooks: Vec<Hook>,
    pub config_schema: serde_json::Value,
}

// ============================================================================
// Validation
// ============================================================================

/// Validation error with field information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(default = "default_error_severity")]
    pub severity: String, // Always "error"
}

fn default_error_severity() -> String {
    "error".to_string()
}

/// Result of configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

// ============================================================================
// Execution
// ============================================================================

/// Release information supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseContext {
    pub version: String,
    pub tag_name: String,
    pub previous_version: String,
    pub repository_owner: String,
    pub repository_name: String,
    pub branch: String,
}

/// A single hook invocation from the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub hook: Hook,
    #[serde(default)]
    pub config: RawConfig,
    #[serde(default)]
    pub context: ReleaseContext,
    #[serde(default)]
    pub dry_run: bool,
}

/// Result of a hook invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub outputs: HashMap<String, serde_json::Value>,
}

impl ExecutionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.outputs.insert(key.to_string(), value.into());
        self
    }
}

// ============================================================================
// Plugin Trait
// ============================================================================

/// Contract a release-automation host uses to drive a plugin
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin metadata and configuration schema
    fn info(&self) -> PluginInfo;

    /// Validate a configuration map, reporting every violated constraint
    async fn validate(&self, config: &RawConfig) -> anyhow::Result<ValidationResult>;

    /// Run the plugin for a hook
    ///
    /// Operational failures are reported through [`ExecutionResult::error`];
    /// an `Err` is reserved for faults the plugin cannot describe as a result.
    async fn execute(&self, request: ExecuteRequest) -> anyhow::Result<ExecutionResult>;
}
