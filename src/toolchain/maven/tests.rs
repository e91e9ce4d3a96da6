use super::*;
use crate::workspace::CLASSPATH_SEPARATOR;
use tempfile::TempDir;

#[tokio::test]
async fn missing_pom_is_reported() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pom = temp_dir.path().join("pom.xml");

    let result = classpath_from_pom(
        "mvn",
        &pom,
        &temp_dir.path().join("cp.txt"),
        Duration::from_secs(5),
    )
    .await;

    let message = result.expect_err("should fail").to_string();
    assert!(message.contains("classpath reference failed. pom.xml path:"));
    assert!(message.contains("pom.xml"));
}

#[tokio::test]
async fn no_pom_uses_default_classpath() {
    let mut config = Config::default();
    config.workspace.default_classpath = "/libs/a.jar".to_string();

    let classpath = additional_classpath(&config)
        .await
        .expect("should resolve classpath");
    assert_eq!(classpath, "/libs/a.jar");

    config.workspace.default_classpath = String::new();
    let classpath = additional_classpath(&config)
        .await
        .expect("should resolve classpath");
    assert!(classpath.is_empty());
}

#[cfg(unix)]
fn fake_mvn(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-mvn");
    std::fs::write(&script, format!("#!/bin/sh\n{}", body)).expect("should write script");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        .expect("should chmod script");
    script.to_string_lossy().into_owned()
}

#[cfg(unix)]
#[tokio::test]
async fn pom_classpath_is_joined_after_default() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pom = temp_dir.path().join("pom.xml");
    std::fs::write(&pom, "<project/>").expect("should write pom");

    // Writes the classpath to the file named by -Dmdep.outputFile=
    let mvn = fake_mvn(
        temp_dir.path(),
        "for a in \"$@\"; do case \"$a\" in -Dmdep.outputFile=*) printf '/m2/dep.jar\\n' > \"${a#-Dmdep.outputFile=}\";; esac; done\n",
    );

    let mut config = Config::default();
    config.workspace.build_path = temp_dir.path().join("tools");
    config.workspace.default_classpath = "/libs/a.jar".to_string();
    config.workspace.pom_xml_path = Some(pom);
    config.toolchain.mvn = mvn;

    let classpath = additional_classpath(&config)
        .await
        .expect("should resolve classpath");
    assert_eq!(
        classpath,
        format!("/libs/a.jar{}/m2/dep.jar", CLASSPATH_SEPARATOR)
    );
}

#[cfg(unix)]
#[tokio::test]
async fn failing_mvn_is_reported() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pom = temp_dir.path().join("pom.xml");
    std::fs::write(&pom, "<project/>").expect("should write pom");
    let mvn = fake_mvn(temp_dir.path(), "echo 'BUILD FAILURE' 1>&2\nexit 1\n");

    let result = classpath_from_pom(
        &mvn,
        &pom,
        &temp_dir.path().join("cp.txt"),
        Duration::from_secs(5),
    )
    .await;

    assert!(matches!(result, Err(JavaTestError::Toolchain(_))));
}
