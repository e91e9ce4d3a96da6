//! Java toolchain operations
//!
//! Each submodule wraps one external tool: `javac` for compilation, the JUnit
//! Platform console launcher for test runs and the JaCoCo CLI for coverage
//! reports. They all resolve their inputs through an [`ExecutionContext`].

pub mod compile;
pub mod coverage;
pub mod junit;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::toolchain::BuildArtifacts;
use crate::workspace::resolve_workspace_path;

pub use compile::{
    CompileOutcome, JavaCompileRequest, JunitCompileRequest, compile_java_files, java_compile,
    junit_compile,
};
pub use coverage::{ClassCoverage, CoverageReport, ReportCoverageRequest, report_coverage};
pub use junit::{JunitReport, RunJunitRequest, run_junit};

pub(crate) fn default_main_bin() -> String {
    "main/bin".to_string()
}

pub(crate) fn default_test_bin() -> String {
    "test/bin".to_string()
}

/// Everything a tool invocation needs besides its own arguments
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub workspace: PathBuf,
    pub artifacts: BuildArtifacts,
    /// Classpath appended to every compilation and test run
    pub additional_classpath: String,
    pub javac: String,
    pub java: String,
    pub timeout: Duration,
}

impl ExecutionContext {
    #[inline]
    pub fn from_config(config: &Config, additional_classpath: String) -> Self {
        Self {
            workspace: config.workspace.workspace_path.clone(),
            artifacts: BuildArtifacts::new(&config.workspace.build_path),
            additional_classpath,
            javac: config.toolchain.javac.clone(),
            java: config.toolchain.java.clone(),
            timeout: config.command_timeout(),
        }
    }

    /// Same context rooted at another workspace
    #[inline]
    pub fn with_workspace(mut self, workspace: PathBuf) -> Self {
        self.workspace = workspace;
        self
    }

    #[inline]
    pub fn resolve(&self, path: &str) -> PathBuf {
        resolve_workspace_path(path, &self.workspace)
    }

    #[inline]
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }
}
