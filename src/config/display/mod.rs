use console::style;
use std::path::Path;

use super::Config;

fn print_setting(name: &str, value: impl std::fmt::Display) {
    eprintln!("  {}: {}", name, style(value).cyan());
}

#[inline]
pub fn show_config(config: &Config, config_path: Option<&Path>) {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Workspace:").bold().yellow());
    print_setting(
        "Client workspace",
        config.workspace.workspace_path.display(),
    );
    print_setting("Build path", config.workspace.build_path.display());
    if config.workspace.default_classpath.is_empty() {
        eprintln!("  Default classpath: {}", style("(none)").dim());
    } else {
        print_setting("Default classpath", &config.workspace.default_classpath);
    }
    match &config.workspace.pom_xml_path {
        Some(pom) => print_setting("pom.xml", pom.display()),
        None => eprintln!("  pom.xml: {}", style("(none)").dim()),
    }

    eprintln!();
    eprintln!("{}", style("Toolchain:").bold().yellow());
    print_setting("javac", &config.toolchain.javac);
    print_setting("java", &config.toolchain.java);
    print_setting("mvn", &config.toolchain.mvn);
    print_setting(
        "Command timeout",
        format!("{}s", config.toolchain.command_timeout_secs),
    );

    eprintln!();
    eprintln!("{}", style("Artifacts:").bold().yellow());
    print_setting("JaCoCo", &config.artifacts.jacoco_url);
    print_setting("JUnit", &config.artifacts.junit_url);
    print_setting(
        "Download timeout",
        format!("{}s", config.artifacts.download_timeout_secs),
    );
    print_setting("Retry attempts", config.artifacts.retry_attempts);

    eprintln!();
    match config_path {
        Some(path) => eprintln!("Config file: {}", style(path.display()).dim()),
        None => eprintln!("Config file: {}", style("(none)").dim()),
    }
}
