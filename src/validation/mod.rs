pub mod config_validator;

pub use config_validator::{
    ConfigValidator, validate_architecture, validate_format, validate_packager,
};
