//! LinuxPkg CLI
//!
//! Drives the plugin the way a release host would: print its metadata,
//! validate a configuration file, or execute a hook.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use linuxpkg::core::logging;
use linuxpkg::{ExecuteRequest, Hook, LinuxPkgPlugin, Plugin, RawConfig, ReleaseContext};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

/// Build deb/rpm/apk packages with nfpm
#[derive(Parser)]
#[command(name = "linuxpkg")]
#[command(version)]
#[command(about = "Build deb/rpm/apk packages with nfpm", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print plugin metadata and configuration schema as JSON
    Info,

    /// Validate a plugin configuration file
    Validate {
        /// Plugin configuration (.json, .yaml, .yml or .toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Run the plugin for a lifecycle hook
    Execute {
        /// Plugin configuration (.json, .yaml, .yml or .toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Lifecycle hook to run
        #[arg(long, default_value = "post-publish")]
        hook: Hook,

        /// Release version
        #[arg(long, value_name = "VERSION", default_value = "")]
        release_version: String,

        /// Release tag
        #[arg(long, default_value = "")]
        tag: String,

        /// Report what would be built without building
        #[arg(long)]
        dry_run: bool,

        /// Directory configured paths are relative to
        #[arg(long, value_name = "DIR")]
        working_dir: Option<PathBuf>,

        /// Per-package nfpm timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info => {
            print_json(&LinuxPkgPlugin::new().info())?;
            Ok(0)
        }
        Commands::Validate { config } => {
            let raw = load_raw_config(config.as_deref()).await?;
            let result = LinuxPkgPlugin::new().validate(&raw).await?;
            print_json(&result)?;
            Ok(if result.valid { 0 } else { 1 })
        }
        Commands::Execute {
            config,
            hook,
            release_version,
            tag,
            dry_run,
            working_dir,
            timeout,
        } => {
            let raw = load_raw_config(config.as_deref()).await?;

            let mut plugin = LinuxPkgPlugin::new();
            if let Some(dir) = working_dir {
                plugin = plugin.with_working_dir(dir);
            }
            if let Some(secs) = timeout {
                plugin = plugin.with_timeout(Duration::from_secs(secs));
            }

            let request = ExecuteRequest {
                hook,
                config: raw,
                context: ReleaseContext {
                    version: release_version,
                    tag_name: tag,
                    ..ReleaseContext::default()
                },
                dry_run,
            };

            let result = plugin.execute(request).await?;
            print_json(&result)?;
            Ok(if result.success { 0 } else { 1 })
        }
    }
}

/// Load a configuration map; no file means an empty map (all defaults)
async fn load_raw_config(path: Option<&Path>) -> Result<RawConfig> {
    let Some(path) = path else {
        return Ok(RawConfig::new());
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let raw: RawConfig = match extension {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?,
        "toml" => toml::from_str(&content)
            .with_context(|| format!("invalid TOML in {}", path.display()))?,
        other => bail!("unsupported config file extension: {:?}", other),
    };

    Ok(raw)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_execute_defaults_to_post_publish() {
        let cli = Cli::try_parse_from(["linuxpkg", "execute", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Execute { hook, dry_run, .. } => {
                assert_eq!(hook, Hook::PostPublish);
                assert!(dry_run);
            }
            _ => panic!("expected execute"),
        }
    }

    #[test]
    fn test_rejects_unknown_hook() {
        assert!(Cli::try_parse_from(["linuxpkg", "execute", "--hook", "post-deploy"]).is_err());
    }

    #[tokio::test]
    async fn test_load_yaml_and_toml_configs() {
        let temp_dir = TempDir::new().unwrap();
        let yaml = temp_dir.path().join("linuxpkg.yaml");
        std::fs::write(&yaml, "formats:\n  - deb\n  - apk\ntarget: arm64\n").unwrap();
        let toml_path = temp_dir.path().join("linuxpkg.toml");
        std::fs::write(&toml_path, "formats = [\"deb\", \"apk\"]\ntarget = \"arm64\"\n").unwrap();

        for path in [yaml, toml_path] {
            let raw = load_raw_config(Some(path.as_path())).await.unwrap();
            assert_eq!(raw["formats"], serde_json::json!(["deb", "apk"]));
            assert_eq!(raw["target"], serde_json::json!("arm64"));
        }
    }

    #[tokio::test]
    async fn test_load_without_file_is_empty() {
        assert!(load_raw_config(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("linuxpkg.ini");
        std::fs::write(&path, "formats=deb").unwrap();

        assert!(load_raw_config(Some(path.as_path())).await.is_err());
    }
}
