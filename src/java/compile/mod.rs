
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ExecutionContext, default_main_bin, default_test_bin};
use crate::process::run_command;
use crate::workspace::{join_classpath, resolve_classpath, resolve_file_list};
use crate::{JavaTestError, Result};

/// `path/to/Foo.java:11: error: ...`
static DIAGNOSTIC_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?\.java):").expect("diagnostic pattern is valid")
});

/// Arguments of the `java_compile` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JavaCompileRequest {
    pub source_files: Vec<String>,
    #[serde(default)]
    pub classpath: String,
    #[serde(default = "default_main_bin")]
    pub output_dir: String,
}

/// Arguments of the `junit_compile` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JunitCompileRequest {
    pub source_files: Vec<String>,
    #[serde(default)]
    pub classpath: String,
    /// Compiled classes under test
    #[serde(default = "default_main_bin")]
    pub target_dir: String,
    /// Output directory for the compiled tests
    #[serde(default = "default_test_bin")]
    pub test_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileOutcome {
    Success {
        compiled_files: Vec<String>,
        output_dir: String,
    },
    /// Some sources failed; the rest were compiled in a second pass
    PartialSuccess {
        compiled_files: Vec<String>,
        failed_files: Vec<String>,
        output_dir: String,
        stderr: String,
    },
}

impl CompileOutcome {
    #[inline]
    pub fn compiled_files(&self) -> &[String] {
        match self {
            Self::Success { compiled_files, .. } | Self::PartialSuccess { compiled_files, .. } => {
                compiled_files
            }
        }
    }

    #[inline]
    pub fn failed_files(&self) -> &[String] {
        match self {
            Self::Success { .. } => &[],
            Self::PartialSuccess { failed_files, .. } => failed_files,
        }
    }
}

/// Source files javac complained about, as they appear in its diagnostics
#[inline]
pub fn failed_sources(stderr: &str) -> BTreeSet<String> {
    stderr
        .lines()
        .filter_map(|line| DIAGNOSTIC_SOURCE.captures(line).ok().flatten())
        .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[inline]
pub fn javac_args(output_dir: &Path, classpath: &str, sources: &[String]) -> Vec<String> {
    let mut args = vec![
        "-d".to_string(),
        output_dir.to_string_lossy().into_owned(),
        "-cp".to_string(),
        classpath.to_string(),
    ];
    args.extend(sources.iter().cloned());
    args
}

/// Compile `sources` into `output_dir`.
///
/// When javac fails, the files named in its diagnostics are dropped and the
/// remaining sources are compiled once more, so one broken file does not
/// block the rest of the tree.
#[inline]
pub async fn compile_java_files(
    javac: &str,
    sources: &[String],
    output_dir: &Path,
    classpath: &str,
    timeout: Duration,
) -> Result<CompileOutcome> {
    if sources.is_empty() {
        return Err(JavaTestError::NoSourceFiles);
    }

    tokio::fs::create_dir_all(output_dir).await?;
    let output_dir_display = output_dir.to_string_lossy().into_owned();

    let first = run_command(javac, &javac_args(output_dir, classpath, sources), timeout).await?;
    if first.success() {
        info!("Compiled {} source files", sources.len());
        return Ok(CompileOutcome::Success {
            compiled_files: sources.to_vec(),
            output_dir: output_dir_display,
        });
    }

    let failed = failed_sources(&first.stderr);
    let remaining: Vec<String> = sources
        .iter()
        .filter(|source| !failed.contains(source.as_str()))
        .cloned()
        .collect();

    if failed.is_empty() || remaining.is_empty() {
        return Err(first.into_error());
    }

    warn!(
        "{} of {} sources failed to compile, retrying the rest",
        failed.len(),
        sources.len()
    );
    debug!("Failed sources: {:?}", failed);

    run_command(javac, &javac_args(output_dir, classpath, &remaining), timeout)
        .await?
        .into_success()?;

    Ok(CompileOutcome::PartialSuccess {
        compiled_files: remaining,
        failed_files: failed.into_iter().collect(),
        output_dir: output_dir_display,
        stderr: first.stderr,
    })
}

#[inline]
pub async fn java_compile(
    ctx: &ExecutionContext,
    request: &JavaCompileRequest,
) -> Result<CompileOutcome> {
    let sources = resolve_file_list(&request.source_files, ctx.workspace())?;
    let classpath = join_classpath([
        resolve_classpath(&request.classpath, ctx.workspace()),
        ctx.additional_classpath.clone(),
    ]);
    let output_dir = ctx.resolve(&request.output_dir);

    compile_java_files(&ctx.javac, &sources, &output_dir, &classpath, ctx.timeout).await
}

#[inline]
pub async fn junit_compile(
    ctx: &ExecutionContext,
    request: &JunitCompileRequest,
) -> Result<CompileOutcome> {
    let sources = resolve_file_list(&request.source_files, ctx.workspace())?;
    let classpath = junit_compile_classpath(ctx, request);
    let output_dir = ctx.resolve(&request.test_dir);

    compile_java_files(&ctx.javac, &sources, &output_dir, &classpath, ctx.timeout).await
}

/// User classpath, then the classes under test, JUnit and the shared extras
#[inline]
pub fn junit_compile_classpath(ctx: &ExecutionContext, request: &JunitCompileRequest) -> String {
    join_classpath([
        resolve_classpath(&request.classpath, ctx.workspace()),
        ctx.resolve(&request.target_dir).to_string_lossy().into_owned(),
        ctx.artifacts.junit_jar().to_string_lossy().into_owned(),
        ctx.additional_classpath.clone(),
    ])
}
