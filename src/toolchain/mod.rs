//! Build-path provisioning
//!
//! The build path holds the JUnit console launcher, the JaCoCo agent and CLI
//! jars, and the `jacoco.exec` coverage data written by test runs. When the
//! directory is missing it is populated from the configured download URLs.

pub mod maven;

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{ArtifactsConfig, Config};
use crate::{JavaTestError, Result};

pub const JUNIT_JAR: &str = "junit.jar";
pub const JACOCO_AGENT_JAR: &str = "jacocoagent.jar";
pub const JACOCO_CLI_JAR: &str = "jacococli.jar";
pub const JACOCO_EXEC: &str = "jacoco.exec";

const JACOCO_ARCHIVE: &str = "jacoco.zip";
const EXPONENTIAL_BACKOFF_BASE: u32 = 2;

/// Well-known files inside the build path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    root: PathBuf,
}

impl BuildArtifacts {
    #[inline]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn junit_jar(&self) -> PathBuf {
        self.root.join(JUNIT_JAR)
    }

    #[inline]
    pub fn jacoco_agent_jar(&self) -> PathBuf {
        self.root.join(JACOCO_AGENT_JAR)
    }

    #[inline]
    pub fn jacoco_cli_jar(&self) -> PathBuf {
        self.root.join(JACOCO_CLI_JAR)
    }

    #[inline]
    pub fn jacoco_exec(&self) -> PathBuf {
        self.root.join(JACOCO_EXEC)
    }

    /// Required jars that are not present
    #[inline]
    pub fn missing(&self) -> Vec<PathBuf> {
        [
            self.junit_jar(),
            self.jacoco_agent_jar(),
            self.jacoco_cli_jar(),
        ]
        .into_iter()
        .filter(|path| !path.is_file())
        .collect()
    }

    #[inline]
    pub fn is_provisioned(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Blocking HTTP downloader with retries
pub struct Downloader {
    agent: ureq::Agent,
    retry_attempts: u32,
    backoff: Duration,
}

impl Downloader {
    #[inline]
    pub fn new(timeout: Duration, retry_attempts: u32) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            retry_attempts: retry_attempts.max(1),
            backoff: Duration::from_millis(1000),
        }
    }

    #[inline]
    pub fn from_config(artifacts: &ArtifactsConfig) -> Self {
        Self::new(
            Duration::from_secs(artifacts.download_timeout_secs),
            artifacts.retry_attempts,
        )
    }

    /// Base delay of the exponential backoff between attempts
    #[inline]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn fetch(&self, url: &str, dest: &Path) -> std::result::Result<u64, ureq::Error> {
        let response = self.agent.get(url).call()?;
        let mut reader = response.into_body().into_reader();
        let mut file = File::create(dest)?;
        Ok(io::copy(&mut reader, &mut file)?)
    }

    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// Server errors and transport failures are retried with exponential
    /// backoff; client errors fail immediately.
    #[inline]
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!(
                "Downloading {} (attempt {}/{})",
                url, attempt, self.retry_attempts
            );

            match self.fetch(url, dest) {
                Ok(bytes) => {
                    info!("Downloaded {} bytes to {}", bytes, dest.display());
                    return Ok(bytes);
                }
                Err(ureq::Error::StatusCode(status)) if status < 500 => {
                    warn!("Client error (status {}), not retrying", status);
                    return Err(download_failed(status));
                }
                Err(ureq::Error::StatusCode(status)) => {
                    warn!(
                        "Server error (status {}), attempt {}/{}",
                        status, attempt, self.retry_attempts
                    );
                    last_error = Some(download_failed(status));
                }
                Err(
                    err @ (ureq::Error::ConnectionFailed
                    | ureq::Error::HostNotFound
                    | ureq::Error::Timeout(_)
                    | ureq::Error::Io(_)),
                ) => {
                    warn!(
                        "Transport error: {}, attempt {}/{}",
                        err, attempt, self.retry_attempts
                    );
                    last_error = Some(download_failed(err));
                }
                Err(err) => {
                    warn!("Non-retryable error: {}", err);
                    return Err(download_failed(err));
                }
            }

            if attempt < self.retry_attempts {
                let delay = self.backoff * EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1);
                debug!("Waiting {:?} before retry", delay);
                std::thread::sleep(delay);
            }
        }

        error!("All download attempts failed for {}", url);
        // A partial file must not pass for a provisioned jar
        let _ = fs::remove_file(dest);
        Err(last_error.unwrap_or_else(|| download_failed("no attempts made")))
    }
}

fn download_failed(reason: impl std::fmt::Display) -> JavaTestError {
    JavaTestError::Toolchain(format!("Failed to download file: {}", reason))
}

/// Copy every archive entry ending in `ext` into `dest`, flattened to its
/// file name.
#[inline]
pub fn extract_files(archive: &Path, dest: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| {
        JavaTestError::Toolchain(format!("Invalid archive {}: {}", archive.display(), e))
    })?;

    let mut extracted = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| JavaTestError::Toolchain(format!("Corrupt archive entry: {}", e)))?;

        if entry.is_dir() || !entry.name().ends_with(ext) {
            continue;
        }
        let Some(file_name) = Path::new(entry.name()).file_name().map(ToOwned::to_owned) else {
            continue;
        };

        let target = dest.join(file_name);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        debug!("Extracted {}", target.display());
        extracted.push(target);
    }

    Ok(extracted)
}

/// Populate the build path if it does not exist yet, or unconditionally when
/// `force` is set. Returns whether anything was downloaded.
#[inline]
pub fn provision(config: &Config, force: bool, progress: &ProgressBar) -> Result<bool> {
    let artifacts = BuildArtifacts::new(&config.workspace.build_path);
    let root = artifacts.root();

    if root.is_dir() && !force {
        let missing = artifacts.missing();
        if missing.is_empty() {
            debug!("Build path {} already provisioned", root.display());
        } else {
            warn!(
                "Build path {} exists but is missing {:?}; run `setup --force` to download again",
                root.display(),
                missing
            );
        }
        return Ok(false);
    }

    fs::create_dir_all(root)?;
    let downloader = Downloader::from_config(&config.artifacts);

    progress.set_message("Downloading JaCoCo distribution...");
    let archive = root.join(JACOCO_ARCHIVE);
    downloader.download(&config.artifacts.jacoco_url, &archive)?;

    progress.set_message("Extracting JaCoCo jars...");
    let jars = extract_files(&archive, root, ".jar")?;
    fs::remove_file(&archive)?;
    info!("Extracted {} JaCoCo jars into {}", jars.len(), root.display());

    progress.set_message("Downloading JUnit console launcher...");
    downloader.download(&config.artifacts.junit_url, &artifacts.junit_jar())?;

    info!("Build path {} provisioned", root.display());
    Ok(true)
}

/// Spinner on an attended terminal, hidden otherwise
#[inline]
pub fn spinner() -> ProgressBar {
    if console::user_attended_stderr() {
        ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("spinner template is valid"),
        )
    } else {
        ProgressBar::hidden()
    }
}

/// Async wrapper around [`provision`] for use from the server and CLI
#[inline]
pub async fn ensure_build_path(config: &Config, force: bool) -> Result<BuildArtifacts> {
    let artifacts = BuildArtifacts::new(&config.workspace.build_path);
    let owned = config.clone();
    let progress = spinner();
    progress.enable_steady_tick(Duration::from_millis(120));

    let task_progress = progress.clone();
    let result = tokio::task::spawn_blocking(move || provision(&owned, force, &task_progress))
        .await
        .map_err(|e| JavaTestError::Toolchain(format!("Provisioning task failed: {}", e)))?;
    progress.finish_and_clear();

    result?;
    Ok(artifacts)
}
