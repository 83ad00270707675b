pub mod command_executor;
pub mod path_guard;

pub use command_executor::{CommandError, CommandExecutor, SafeCommandExecutor};
pub use path_guard::{clean_path, validate_path};
