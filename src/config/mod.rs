// Configuration management module
// Layers the optional TOML file and the launcher environment into one `Config`

pub mod display;
pub mod settings;

pub use display::show_config;
pub use settings::{ArtifactsConfig, Config, ConfigError, ToolchainConfig, WorkspaceConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
