#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

//! Compilation against a real JDK. Skipped when `javac` is not on PATH.

use java_test_mcp::java::{
    CompileOutcome, ExecutionContext, JavaCompileRequest, JunitCompileRequest, java_compile,
    junit_compile,
};
use java_test_mcp::toolchain::BuildArtifacts;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const HELLO_WORLD: &str = r#"package com.example;

public class HelloWorld {
    public static String greet(String name) {
        return "Hello, " + name + "!";
    }
}
"#;

const BROKEN: &str = r#"package com.example;

public class Broken {
    public static int value() {
        return "not an int"
    }
}
"#;

fn javac_available() -> bool {
    std::process::Command::new("javac")
        .arg("-version")
        .output()
        .is_ok_and(|output| output.status.success())
}

fn context(workspace: &Path) -> ExecutionContext {
    ExecutionContext {
        workspace: workspace.to_path_buf(),
        artifacts: BuildArtifacts::new(workspace.join("tools")),
        additional_classpath: String::new(),
        javac: "javac".to_string(),
        java: "java".to_string(),
        timeout: Duration::from_secs(120),
    }
}

fn write_source(workspace: &Path, name: &str, body: &str) {
    let dir = workspace.join("src/com/example");
    fs::create_dir_all(&dir).expect("should create source dir");
    fs::write(dir.join(name), body).expect("should write source");
}

#[tokio::test]
async fn compiles_sources_matched_by_pattern() {
    if !javac_available() {
        eprintln!("javac not found; skipping");
        return;
    }

    let workspace = TempDir::new().expect("should create temp dir");
    write_source(workspace.path(), "HelloWorld.java", HELLO_WORLD);

    let outcome = java_compile(
        &context(workspace.path()),
        &JavaCompileRequest {
            source_files: vec!["src/**/*.java".to_string()],
            classpath: String::new(),
            output_dir: "main/bin".to_string(),
        },
    )
    .await
    .expect("compilation should succeed");

    assert!(matches!(outcome, CompileOutcome::Success { .. }));
    assert_eq!(outcome.compiled_files().len(), 1);
    assert!(
        workspace
            .path()
            .join("main/bin/com/example/HelloWorld.class")
            .is_file()
    );
}

#[tokio::test]
async fn broken_sources_give_partial_success() {
    if !javac_available() {
        eprintln!("javac not found; skipping");
        return;
    }

    let workspace = TempDir::new().expect("should create temp dir");
    write_source(workspace.path(), "HelloWorld.java", HELLO_WORLD);
    write_source(workspace.path(), "Broken.java", BROKEN);

    let outcome = java_compile(
        &context(workspace.path()),
        &JavaCompileRequest {
            source_files: vec!["src/**/*.java".to_string()],
            classpath: String::new(),
            output_dir: "main/bin".to_string(),
        },
    )
    .await
    .expect("partial success is not an error");

    match &outcome {
        CompileOutcome::PartialSuccess {
            failed_files,
            stderr,
            ..
        } => {
            assert_eq!(failed_files.len(), 1);
            assert!(failed_files[0].ends_with("Broken.java"));
            assert!(stderr.contains("Broken.java"));
        }
        CompileOutcome::Success { .. } => panic!("Broken.java should not compile"),
    }
    assert!(
        outcome.compiled_files()[0].ends_with("HelloWorld.java"),
        "{:?}",
        outcome.compiled_files()
    );
    assert!(
        workspace
            .path()
            .join("main/bin/com/example/HelloWorld.class")
            .is_file()
    );
}

#[tokio::test]
async fn junit_compile_without_junit_jar_reports_javac_failure() {
    if !javac_available() {
        eprintln!("javac not found; skipping");
        return;
    }

    let workspace = TempDir::new().expect("should create temp dir");
    let test_dir = workspace.path().join("test/src");
    fs::create_dir_all(&test_dir).expect("should create test dir");
    fs::write(
        test_dir.join("HelloWorldTest.java"),
        "import org.junit.jupiter.api.Test;\npublic class HelloWorldTest {\n    @Test\n    void greets() {}\n}\n",
    )
    .expect("should write test source");

    let result = junit_compile(
        &context(workspace.path()),
        &JunitCompileRequest {
            source_files: vec!["test/src/*.java".to_string()],
            classpath: String::new(),
            target_dir: "main/bin".to_string(),
            test_dir: "test/bin".to_string(),
        },
    )
    .await;

    // The only source fails, so there is nothing left to retry
    let error = result.expect_err("compilation should fail");
    assert!(
        error.to_string().starts_with("Command failed with exit code"),
        "{}",
        error
    );
}
