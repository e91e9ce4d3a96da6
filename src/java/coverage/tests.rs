use super::*;
use crate::toolchain::BuildArtifacts;
use std::time::Duration;

const SAMPLE_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!DOCTYPE report PUBLIC "-//JACOCO//DTD Report 1.1//EN" "report.dtd">
<report name="JaCoCo Coverage Report">
  <sessioninfo id="host-1234" start="1700000000000" dump="1700000001000"/>
  <package name="com/example">
    <class name="com/example/HelloWorld" sourcefilename="HelloWorld.java">
      <method name="&lt;init&gt;" desc="()V" line="3">
        <counter type="INSTRUCTION" missed="0" covered="3"/>
        <counter type="LINE" missed="0" covered="1"/>
      </method>
      <method name="greet" desc="()Ljava/lang/String;" line="5">
        <counter type="LINE" missed="1" covered="2"/>
      </method>
      <counter type="INSTRUCTION" missed="4" covered="12"/>
      <counter type="LINE" missed="1" covered="3"/>
      <counter type="METHOD" missed="0" covered="2"/>
    </class>
    <class name="com/example/Unused" sourcefilename="Unused.java">
      <counter type="LINE" missed="3" covered="0"/>
    </class>
    <class name="com/example/Marker" sourcefilename="Marker.java"/>
    <sourcefile name="HelloWorld.java">
      <line nr="3" mi="0" ci="3" mb="0" cb="0"/>
      <counter type="LINE" missed="1" covered="3"/>
    </sourcefile>
    <counter type="LINE" missed="4" covered="3"/>
  </package>
  <package name="com/example/util">
    <class name="com/example/util/MathUtil" sourcefilename="MathUtil.java">
      <counter type="LINE" missed="1" covered="2"/>
    </class>
  </package>
  <counter type="LINE" missed="5" covered="5"/>
</report>
"#;

fn context() -> ExecutionContext {
    ExecutionContext {
        workspace: PathBuf::from("/workspace"),
        artifacts: BuildArtifacts::new("/opt/tools"),
        additional_classpath: String::new(),
        javac: "javac".to_string(),
        java: "java".to_string(),
        timeout: Duration::from_secs(30),
    }
}

#[test]
fn class_level_line_counters() {
    let report = parse_coverage_report(SAMPLE_REPORT).expect("report parses");

    assert_eq!(report.len(), 2);
    let example = &report["com/example"];
    assert_eq!(example.len(), 3);

    let hello = &example["com/example/HelloWorld"];
    assert_eq!(hello.lines_covered, 3);
    assert_eq!(hello.total_lines, 4);
    assert!((hello.coverage_percentage - 75.0).abs() < f64::EPSILON);

    let unused = &example["com/example/Unused"];
    assert_eq!(unused.total_lines, 3);
    assert!(unused.coverage_percentage.abs() < f64::EPSILON);

    let math = &report["com/example/util"]["com/example/util/MathUtil"];
    assert!((math.coverage_percentage - 66.67).abs() < 1e-9);
}

#[test]
fn class_without_line_counter() {
    let report = parse_coverage_report(SAMPLE_REPORT).expect("report parses");
    let marker = &report["com/example"]["com/example/Marker"];

    assert_eq!(marker, &ClassCoverage::from_counter(0, 0));
    assert_eq!(marker.total_lines, 0);
}

#[test]
fn empty_report() {
    let report = parse_coverage_report(
        r#"<?xml version="1.0"?><report name="empty"><counter type="LINE" missed="0" covered="0"/></report>"#,
    )
    .expect("report parses");
    assert!(report.is_empty());
}

#[test]
fn malformed_xml_is_rejected() {
    let result = parse_coverage_report("<report><package name=\"a\"></report>");
    assert!(matches!(result, Err(JavaTestError::Coverage(_))));
}

#[test]
fn invalid_counter_value() {
    let xml = r#"<report><package name="p"><class name="p/A"><counter type="LINE" missed="x" covered="1"/></class></package></report>"#;
    assert!(matches!(
        parse_coverage_report(xml),
        Err(JavaTestError::Coverage(_))
    ));
}

#[test]
fn percentage_rounding() {
    assert!((ClassCoverage::from_counter(2, 1).coverage_percentage - 33.33).abs() < 1e-9);
    assert!((ClassCoverage::from_counter(0, 5).coverage_percentage - 100.0).abs() < 1e-9);
}

#[test]
fn percentage_ties_round_to_even() {
    // 5 of 800 lines is exactly 0.625%
    assert!((ClassCoverage::from_counter(795, 5).coverage_percentage - 0.62).abs() < 1e-9);
    assert!((ClassCoverage::from_counter(797, 3).coverage_percentage - 0.38).abs() < 1e-9);
}

#[test]
fn classfiles_narrowed_by_package() {
    let ctx = context();
    let request = ReportCoverageRequest {
        classfiles_dir: "main/bin".to_string(),
        package_name: "com.example.report".to_string(),
    };

    assert_eq!(
        classfiles_path(&ctx, &request),
        PathBuf::from("/workspace").join("main/bin").join("com/example/report")
    );

    let request = ReportCoverageRequest {
        package_name: String::new(),
        ..request
    };
    assert_eq!(
        classfiles_path(&ctx, &request),
        PathBuf::from("/workspace").join("main/bin")
    );
}

#[test]
fn jacoco_cli_arguments() {
    let ctx = context();
    let args = report_args(
        &ctx,
        Path::new("/workspace/main/bin"),
        Path::new("/workspace/jacoco-report/jacoco.xml"),
    );

    assert_eq!(args[0], "-jar");
    assert!(args[1].ends_with("jacococli.jar"));
    assert_eq!(args[2], "report");
    assert!(args[3].ends_with("jacoco.exec"));
    assert_eq!(
        &args[4..],
        [
            "--classfiles",
            "/workspace/main/bin",
            "--sourcefiles",
            ".",
            "--xml",
            "/workspace/jacoco-report/jacoco.xml"
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn report_is_generated_and_parsed() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempfile::TempDir::new().expect("should create temp dir");
    let fixture = temp_dir.path().join("fixture.xml");
    std::fs::write(&fixture, SAMPLE_REPORT).expect("should write fixture");

    // Fake `java -jar jacococli.jar report ... --xml <out>` copying the fixture
    let script = temp_dir.path().join("fake-java");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\nfor last; do :; done\ncp '{}' \"$last\"\n",
            fixture.display()
        ),
    )
    .expect("should write script");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        .expect("should chmod script");

    let ctx = ExecutionContext {
        workspace: temp_dir.path().to_path_buf(),
        java: script.to_string_lossy().into_owned(),
        ..context()
    };
    let request = ReportCoverageRequest {
        classfiles_dir: "main/bin".to_string(),
        package_name: String::new(),
    };

    let report = report_coverage(&ctx, &request).await.expect("coverage report");
    assert_eq!(report.len(), 2);
    assert!(temp_dir.path().join(REPORT_DIR).join(REPORT_FILE).exists());
}
