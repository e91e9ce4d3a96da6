
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const ENV_CLIENT_WORKSPACE: &str = "CLIENT_WORKSPACE";
pub const ENV_BUILD_WORKSPACE: &str = "JAVA_BUILD_WORKSPACE";
pub const ENV_DEFAULT_CLASSPATH: &str = "DEFAULT_CLASSPATH_PATH";
pub const ENV_POM_XML_PATH: &str = "POM_XML_PATH";

pub const DEFAULT_JACOCO_URL: &str =
    "https://search.maven.org/remotecontent?filepath=org/jacoco/jacoco/0.8.12/jacoco-0.8.12.zip";
pub const DEFAULT_JUNIT_URL: &str = "https://oss.sonatype.org/content/repositories/snapshots/org/junit/platform/junit-platform-console-standalone/1.10.6-SNAPSHOT/junit-platform-console-standalone-1.10.6-20241004.130129-1.jar";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

/// Where the client's sources live and where the test tooling is kept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub workspace_path: PathBuf,
    pub build_path: PathBuf,
    pub default_classpath: String,
    pub pom_xml_path: Option<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            workspace_path: PathBuf::from("."),
            build_path: PathBuf::from("./junit_jacoco_jar_path"),
            default_classpath: String::new(),
            pom_xml_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolchainConfig {
    pub javac: String,
    pub java: String,
    pub mvn: String,
    pub command_timeout_secs: u64,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            javac: "javac".to_string(),
            java: "java".to_string(),
            mvn: "mvn".to_string(),
            command_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub jacoco_url: String,
    pub junit_url: String,
    pub download_timeout_secs: u64,
    pub retry_attempts: u32,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            jacoco_url: DEFAULT_JACOCO_URL.to_string(),
            junit_url: DEFAULT_JUNIT_URL.to_string(),
            download_timeout_secs: 120,
            retry_attempts: 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid URL scheme: {0} (must be 'http' or 'https')")]
    InvalidScheme(String),
    #[error("Invalid command timeout: {0} (must be between 1 and 3600 seconds)")]
    InvalidCommandTimeout(u64),
    #[error("Invalid download timeout: {0} (must be between 1 and 3600 seconds)")]
    InvalidDownloadTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid executable for {0}: (cannot be empty)")]
    InvalidExecutable(&'static str),
    #[error("Workspace path cannot be empty")]
    EmptyWorkspacePath,
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".java-test-mcp"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("java-test-mcp"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the configuration file (if any) and apply environment overrides.
    ///
    /// With `path == None` the file under [`Config::config_dir`] is used; a
    /// missing file means defaults.
    #[inline]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Ok(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_with(|key| std::env::var(key).ok());

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Parse a TOML file without applying environment overrides
    #[inline]
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Overlay the launcher-provided environment onto the file settings
    #[inline]
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(workspace) = non_empty(ENV_CLIENT_WORKSPACE) {
            self.workspace.workspace_path = PathBuf::from(workspace);
        }
        if let Some(build) = non_empty(ENV_BUILD_WORKSPACE) {
            self.workspace.build_path = PathBuf::from(build);
        }
        if let Some(classpath) = lookup(ENV_DEFAULT_CLASSPATH) {
            self.workspace.default_classpath = classpath;
        }
        if let Some(pom) = non_empty(ENV_POM_XML_PATH) {
            self.workspace.pom_xml_path = Some(PathBuf::from(pom));
        }
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace.workspace_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyWorkspacePath);
        }
        self.toolchain.validate()?;
        self.artifacts.validate()?;
        Ok(())
    }

    #[inline]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.toolchain.command_timeout_secs)
    }

    #[inline]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.artifacts.download_timeout_secs)
    }
}

impl ToolchainConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.javac.trim().is_empty() {
            return Err(ConfigError::InvalidExecutable("javac"));
        }
        if self.java.trim().is_empty() {
            return Err(ConfigError::InvalidExecutable("java"));
        }
        if self.mvn.trim().is_empty() {
            return Err(ConfigError::InvalidExecutable("mvn"));
        }
        if !(1..=3600).contains(&self.command_timeout_secs) {
            return Err(ConfigError::InvalidCommandTimeout(
                self.command_timeout_secs,
            ));
        }
        Ok(())
    }
}

impl ArtifactsConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_download_url(&self.jacoco_url)?;
        validate_download_url(&self.junit_url)?;

        if !(1..=3600).contains(&self.download_timeout_secs) {
            return Err(ConfigError::InvalidDownloadTimeout(
                self.download_timeout_secs,
            ));
        }
        if !(1..=10).contains(&self.retry_attempts) {
            return Err(ConfigError::InvalidRetryAttempts(self.retry_attempts));
        }
        Ok(())
    }
}

fn validate_download_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidScheme(other.to_string())),
    }
}
