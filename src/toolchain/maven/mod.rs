#[cfg(test)]
mod tests;

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::process::run_command;
use crate::workspace::join_classpath;
use crate::{JavaTestError, Result};

/// File the dependency plugin writes the classpath into
pub const CLASSPATH_OUTPUT_FILE: &str = "cp.txt";

fn reference_failed(pom: &Path) -> JavaTestError {
    JavaTestError::Toolchain(format!(
        "classpath reference failed. pom.xml path: {}",
        pom.display()
    ))
}

/// Resolve the dependency classpath of a Maven project via
/// `mvn dependency:build-classpath`.
#[inline]
pub async fn classpath_from_pom(
    mvn: &str,
    pom: &Path,
    output_file: &Path,
    timeout: Duration,
) -> Result<String> {
    if !pom.is_file() {
        warn!("pom.xml not found at {}", pom.display());
        return Err(reference_failed(pom));
    }

    let pom = std::path::absolute(pom).map_err(|_| reference_failed(pom))?;
    let output_file = std::path::absolute(output_file).map_err(|_| reference_failed(&pom))?;

    let args = vec![
        "-f".to_string(),
        pom.to_string_lossy().into_owned(),
        "dependency:build-classpath".to_string(),
        format!("-Dmdep.outputFile={}", output_file.display()),
    ];

    let output = run_command(mvn, &args, timeout)
        .await
        .map_err(|_| reference_failed(&pom))?;
    if !output.success() {
        debug!("mvn stderr: {}", output.stderr);
        warn!("mvn exited with code {}", output.code);
        return Err(reference_failed(&pom));
    }

    let classpath = tokio::fs::read_to_string(&output_file)
        .await
        .map_err(|_| reference_failed(&pom))?;
    let classpath = classpath.trim().to_string();

    info!("Resolved Maven classpath from {}", pom.display());
    Ok(classpath)
}

/// Classpath appended to every compilation and test run: the configured
/// default classpath followed by the pom dependencies, if a pom is set.
#[inline]
pub async fn additional_classpath(config: &Config) -> Result<String> {
    let pom_classpath = match &config.workspace.pom_xml_path {
        Some(pom) => {
            tokio::fs::create_dir_all(&config.workspace.build_path).await?;
            let output_file = config.workspace.build_path.join(CLASSPATH_OUTPUT_FILE);
            classpath_from_pom(
                &config.toolchain.mvn,
                pom,
                &output_file,
                config.command_timeout(),
            )
            .await?
        }
        None => String::new(),
    };

    Ok(join_classpath([
        config.workspace.default_classpath.as_str(),
        pom_classpath.as_str(),
    ]))
}
