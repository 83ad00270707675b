pub mod core;
pub mod orchestration;
pub mod plugins;
pub mod security;
pub mod validation;

pub use self::core::*;
pub use orchestration::PackageBuilder;
pub use plugins::LinuxPkgPlugin;
pub use security::{CommandError, CommandExecutor, SafeCommandExecutor};
pub use validation::ConfigValidator;
