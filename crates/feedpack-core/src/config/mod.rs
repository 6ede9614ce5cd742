//! Project configuration loaded from `feedpack.toml`.
//!
//! Every field is optional. Relative paths are resolved against the
//! directory holding the config file, then CLI overrides are applied when
//! building a [`crate::context::BuildContext`].

pub mod parser;
pub mod schema;

pub use parser::{load_or_default, parse_config, parse_config_str, to_toml};
pub use schema::{DeviceConfig, FrontendConfig, PackConfig, PathsConfig};

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "feedpack.toml";
