use super::*;

#[test]
fn command_line_formatting() {
    let args = vec!["-d".to_string(), "out".to_string(), "A.java".to_string()];
    assert_eq!(format_command_line("javac", &args), "javac -d out A.java");
    assert_eq!(format_command_line("java", &[]), "java");
}

#[test]
fn failed_output_becomes_command_error() {
    let output = CommandOutput {
        program: "javac".to_string(),
        code: 2,
        stdout: String::new(),
        stderr: "A.java:1: error: ';' expected".to_string(),
        command_line: "javac A.java".to_string(),
    };

    match output.into_success() {
        Err(JavaTestError::CommandFailed { program, code, stderr }) => {
            assert_eq!(program, "javac");
            assert_eq!(code, 2);
            assert!(stderr.contains("';' expected"));
        }
        other => panic!("Expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn command_error_message() {
    let error = JavaTestError::CommandFailed {
        program: "java".to_string(),
        code: 1,
        stderr: "boom".to_string(),
    };
    assert_eq!(error.to_string(), "Command failed with exit code 1:\nboom");
}

#[tokio::test]
async fn missing_program_is_toolchain_error() {
    let result = run_command(
        "definitely-not-a-real-java-tool",
        &[],
        Duration::from_secs(5),
    )
    .await;

    assert!(matches!(result, Err(JavaTestError::Toolchain(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn captures_both_streams() {
    let args = vec![
        "-c".to_string(),
        "echo out; echo err 1>&2; exit 3".to_string(),
    ];
    let output = run_command("sh", &args, Duration::from_secs(10))
        .await
        .expect("sh should run");

    assert_eq!(output.code, 3);
    assert_eq!(output.stdout.trim(), "out");
    assert_eq!(output.stderr.trim(), "err");
    assert!(!output.success());
}

#[cfg(unix)]
#[tokio::test]
async fn timeout_reports_failure() {
    let args = vec!["-c".to_string(), "sleep 5".to_string()];
    let output = run_command("sh", &args, Duration::from_millis(200))
        .await
        .expect("timeout is reported as output");

    assert_eq!(output.code, -1);
    assert!(output.stderr.contains("timed out"));
}
