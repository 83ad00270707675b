pub mod linuxpkg_plugin;

pub use linuxpkg_plugin::{LinuxPkgPlugin, PLUGIN_NAME};
