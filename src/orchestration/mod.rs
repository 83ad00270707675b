//! Orchestration layer for package building
//!
//! Turns a validated configuration into nfpm invocations and collects the
//! produced artifact paths.

pub mod package_builder;

pub use package_builder::{
    PACKAGING_TOOL, PackageBuilder, fallback_package_path, native_architecture, package_args,
    parse_package_path, resolve_target,
};
