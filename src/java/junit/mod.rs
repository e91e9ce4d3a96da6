
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{info, warn};

use super::{ExecutionContext, default_main_bin, default_test_bin};
use crate::Result;
use crate::process::run_command;
use crate::workspace::{join_classpath, resolve_classpath};

pub const CONSOLE_LAUNCHER: &str = "org.junit.platform.console.ConsoleLauncher";

/// Summary table rows such as `[         3 tests successful      ]`
static SUMMARY_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\s*(\d+)\s+([\w\s]+)\s*\]").expect("summary pattern is valid")
});

/// Arguments of the `run_junit` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunJunitRequest {
    #[serde(default)]
    pub package_name: String,
    #[serde(default = "default_main_bin")]
    pub target_dir: String,
    #[serde(default = "default_test_bin")]
    pub test_dir: String,
    #[serde(default)]
    pub test_classes: Vec<String>,
    #[serde(default)]
    pub classpath: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JunitReport {
    pub exit_code: i32,
    pub tests_passed: bool,
    pub summary: BTreeMap<String, u64>,
    /// The launcher invocation, for reproducing the run by hand
    pub command: String,
}

/// Parse the console launcher's summary table into `label -> count`
#[inline]
pub fn parse_summary(stdout: &str) -> BTreeMap<String, u64> {
    let mut summary = BTreeMap::new();

    for line in stdout.lines() {
        let Ok(Some(captures)) = SUMMARY_ROW.captures(line) else {
            continue;
        };
        let (Some(value), Some(key)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        if let Ok(count) = value.as_str().parse::<u64>() {
            summary.insert(key.as_str().trim().to_string(), count);
        }
    }

    summary
}

/// Fully qualified class selectors; bare names get the package prefix
#[inline]
pub fn class_selectors(package_name: &str, test_classes: &[String]) -> Vec<String> {
    test_classes
        .iter()
        .map(|class| {
            if package_name.is_empty() || class.starts_with(package_name) {
                class.clone()
            } else {
                format!("{}.{}", package_name, class)
            }
        })
        .collect()
}

/// Arguments for `java` running the console launcher under the JaCoCo agent
#[inline]
pub fn junit_args(ctx: &ExecutionContext, request: &RunJunitRequest) -> Vec<String> {
    let target_dir = ctx.resolve(&request.target_dir);
    let test_dir = ctx.resolve(&request.test_dir);

    let includes = if request.package_name.is_empty() {
        ".*".to_string()
    } else {
        format!("{}.*", request.package_name)
    };

    let classpath = join_classpath([
        resolve_classpath(&request.classpath, ctx.workspace()),
        ctx.additional_classpath.clone(),
        target_dir.to_string_lossy().into_owned(),
        test_dir.to_string_lossy().into_owned(),
        ctx.artifacts.junit_jar().to_string_lossy().into_owned(),
    ]);

    let mut args = vec![
        format!(
            "-javaagent:{}=destfile={},includes={}",
            ctx.artifacts.jacoco_agent_jar().display(),
            ctx.artifacts.jacoco_exec().display(),
            includes
        ),
        "-cp".to_string(),
        classpath,
        CONSOLE_LAUNCHER.to_string(),
    ];

    if request.test_classes.is_empty() {
        args.push("--scan-classpath".to_string());
        args.push(test_dir.to_string_lossy().into_owned());
    } else {
        for selector in class_selectors(&request.package_name, &request.test_classes) {
            args.push("--select-class".to_string());
            args.push(selector);
        }
    }

    args
}

/// Run the tests and summarise the launcher output.
///
/// The launcher exits non-zero when tests fail; that is still a report as
/// long as the summary table was printed.
#[inline]
pub async fn run_junit(ctx: &ExecutionContext, request: &RunJunitRequest) -> Result<JunitReport> {
    let output = run_command(&ctx.java, &junit_args(ctx, request), ctx.timeout).await?;
    let summary = parse_summary(&output.stdout);

    if !output.success() && summary.is_empty() {
        return Err(output.into_error());
    }

    let failed = summary.get("tests failed").copied().unwrap_or(0);
    let tests_passed = output.success() && failed == 0;
    if tests_passed {
        info!(
            "JUnit run passed ({} tests)",
            summary.get("tests successful").copied().unwrap_or(0)
        );
    } else {
        warn!("JUnit run reported {} failed tests", failed);
    }

    Ok(JunitReport {
        exit_code: output.code,
        tests_passed,
        summary,
        command: output.command_line,
    })
}
