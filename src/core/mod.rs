pub mod config;
pub mod error;
pub mod logging;
pub mod traits;

pub use config::*;
pub use error::*;
pub use traits::*;
